// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use research_rs::research::server;
use research_rs::research::{ResearchConfig, ResearchState, Researcher};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Research a single question and print the report
    Ask {
        /// The question to research
        #[arg(short, long)]
        question: String,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = ResearchConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    let researcher = Researcher::from_config(&config)?;

    match args.command {
        Commands::Ask { question, json } => {
            let state = researcher.run_research(&question).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_report(&state);
            }
        }
        Commands::Serve { port } => {
            server::serve(researcher, port).await?;
        }
    }

    Ok(())
}

fn print_report(state: &ResearchState) {
    println!("{}", state.summary());

    let results = state.search_results();
    if state.report().is_some() && !results.is_empty() {
        println!("\nSources:");
        for (i, result) in results.iter().enumerate() {
            println!("[{}] {} - {}", i + 1, result.title, result.url);
        }
    }
}
