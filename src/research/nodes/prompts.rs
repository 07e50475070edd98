// SPDX-License-Identifier: MIT

//! Prompt text for the research nodes

use crate::research::types::SearchResult;

pub const VALIDATE_SYSTEM: &str = "You screen questions for an automated web research assistant. \
Decide whether the question is well-formed and specific enough to be answered by searching the web \
and summarizing what is found. Reject empty input, keyboard mashing, and requests that are not \
questions or research tasks. Give a one-sentence reason, and when you reject a question suggest a \
clearer phrasing if one is obvious.";

pub const PLAN_SYSTEM: &str = "You are a research planner. Given a question, write between 2 and 4 \
web search queries that together cover what is needed to answer it, plus a short explanation of \
your strategy. Reply with a JSON object in a ```json fenced block, shaped exactly like:\n\
{\"queries\": [\"first query\", \"second query\"], \"reasoning\": \"why these queries\"}";

pub const SYNTHESIZE_SYSTEM: &str = "You are a research analyst. Write a clear report of 200 to 400 \
words that answers the question using only the numbered sources provided. Cite sources inline with \
their bracketed number, for example [1] or [2][3], every time you use them. Do not invent sources \
or cite numbers that are not listed.";

/// Report used when search found nothing to synthesize from
pub const NO_RESULTS_REPORT: &str = "No search results were found for this question, \
so no report could be written. Try rephrasing the question or making it more specific.";

pub fn plan_request(question: &str) -> String {
    format!("Question: {}", question)
}

/// Number results from 1 in the order given
pub fn evidence_block(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {}\n{}\n{}", i + 1, r.title, r.url, r.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn synthesize_request(question: &str, results: &[SearchResult]) -> String {
    format!(
        "Question: {}\n\nSources:\n\n{}",
        question,
        evidence_block(results)
    )
}
