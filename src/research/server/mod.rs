// SPDX-License-Identifier: MIT

//! HTTP surface for the researcher

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adk::error::ResearchError;
use crate::research::pipeline::Researcher;

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub question: String,
}

pub fn router(researcher: Arc<Researcher>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/research", post(research))
        .route("/api/research/stream", post(stream_research))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(researcher)
}

pub async fn serve(researcher: Researcher, port: u16) -> Result<(), ResearchError> {
    let app = router(Arc::new(researcher));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn research(
    State(researcher): State<Arc<Researcher>>,
    Json(payload): Json<ResearchRequest>,
) -> (StatusCode, Json<Value>) {
    let question = payload.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "question must not be empty" })),
        );
    }

    match researcher.run_research(question).await {
        Ok(state) => match serde_json::to_value(&state) {
            Ok(body) => (StatusCode::OK, Json(body)),
            Err(e) => internal_error(e.to_string()),
        },
        Err(e) => {
            log::error!("Research failed: {}", e);
            internal_error(e.to_string())
        }
    }
}

fn internal_error(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

/// Progress events as `progress`, then one `result` or `error` event
async fn stream_research(
    State(researcher): State<Arc<Researcher>>,
    Json(payload): Json<ResearchRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Event>(100);
    tokio::spawn(stream_run(researcher, payload.question, tx));

    let stream = ReceiverStream::new(rx).map(Ok);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
}

/// Drive one streamed run into `tx`. The run is dropped, and with it any
/// in-flight model or search call, as soon as the client goes away.
async fn stream_run(
    researcher: Arc<Researcher>,
    question: String,
    tx: mpsc::Sender<Event>,
) {
    let question = question.trim().to_string();
    if question.is_empty() {
        let _ = tx
            .send(sse_event(
                "error",
                &json!({ "error": "question must not be empty" }),
            ))
            .await;
        return;
    }

    let (events_tx, mut events_rx) = mpsc::channel(100);
    let progress = tx.clone();
    let forward = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if progress.send(sse_event("progress", &event)).await.is_err() {
                break;
            }
        }
    });

    let outcome = tokio::select! {
        outcome = researcher.run_research_stream(&question, events_tx) => outcome,
        _ = tx.closed() => {
            log::info!("Client disconnected, cancelling research run");
            forward.abort();
            return;
        }
    };
    let _ = forward.await;

    let last = match outcome {
        Ok(state) => sse_event("result", &state),
        Err(e) => {
            log::error!("Streamed research failed: {}", e);
            sse_event("error", &json!({ "error": e.to_string() }))
        }
    };
    let _ = tx.send(last).await;
}

fn sse_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
