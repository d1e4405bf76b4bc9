//! Chat subsystem: one conversational turn against the orchestrator.
//!
//! Reuses the caller's thread when given, otherwise opens a new one; posts
//! the user message, runs the agent and waits for the run to settle.

use std::time::Duration;

use axum::http::StatusCode;
use campaign_core::api::{ChatRequest, ChatResponse};
use campaign_core::models::{MessageRole, RunStatus, SortOrder};
use campaign_core::Orchestrator;
use serde_json::{json, Value};

use crate::http::to_json;

/// Message used when the caller sends nothing.
const DEFAULT_MESSAGE: &str = "Hi";

pub async fn chat_inner(
    orchestrator: &Orchestrator,
    agent_id: &str,
    poll_interval: Duration,
    req: ChatRequest,
) -> (StatusCode, Value) {
    let text = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MESSAGE);

    let thread_id = match req.thread_id.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(id) => match orchestrator.get_thread(id).await {
            Some(thread) => thread.id,
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    json!({ "error": format!("Thread {} not found", id), "threadId": id }),
                );
            }
        },
        None => {
            orchestrator
                .create_thread(Some(json!({ "source": "api/chat" })))
                .await
                .id
        }
    };

    let turn = async {
        orchestrator.create_message(&thread_id, MessageRole::User, text).await?;
        let run = orchestrator.create_run(&thread_id, agent_id).await?;
        orchestrator.wait_for_run(&thread_id, &run.id, poll_interval).await
    };

    match turn.await {
        Ok(run) => {
            let answer = orchestrator
                .list_messages(&thread_id, SortOrder::Descending)
                .await
                .into_iter()
                .find(|m| m.role == MessageRole::Assistant)
                .map(|m| m.content);

            tracing::info!(thread_id = %thread_id, run_id = %run.id, "Chat turn completed");
            to_json(
                StatusCode::OK,
                &ChatResponse {
                    thread_id,
                    answer,
                    status: run.status.as_str().to_string(),
                    error: None,
                },
            )
        }
        Err(e) => {
            tracing::warn!(thread_id = %thread_id, error = %e, "Chat turn did not complete");
            to_json(
                StatusCode::BAD_GATEWAY,
                &ChatResponse {
                    thread_id,
                    answer: None,
                    status: failure_status(&e).as_str().to_string(),
                    error: Some(e.to_string()),
                },
            )
        }
    }
}

fn failure_status(e: &campaign_core::OrchestratorError) -> RunStatus {
    match e {
        campaign_core::OrchestratorError::RunCancelled(_) => RunStatus::Cancelled,
        _ => RunStatus::Failed,
    }
}
