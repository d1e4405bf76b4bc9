//! Client for the Azure AI agent backend (thread / message / health routes).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Agent backend error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub thread_id: String,
    pub run_id: String,
    pub run_status: String,
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub thread_id: String,
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentHealth {
    pub status: String,
    #[serde(default)]
    pub azure_connected: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub agent_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    thread_id: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ListMessagesRequest<'a> {
    thread_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AgentClientError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_thread(&self) -> Result<ThreadResponse, AgentClientError> {
        let response = self
            .client
            .post(format!("{}/api/azure-agent/thread/create", self.base_url))
            .send()
            .await?;
        decode(response, "Failed to create thread").await
    }

    pub async fn send_message(&self, thread_id: &str, content: &str) -> Result<MessageResponse, AgentClientError> {
        let response = self
            .client
            .post(format!("{}/api/azure-agent/message/send", self.base_url))
            .json(&SendMessageRequest { thread_id, content })
            .send()
            .await?;
        decode(response, "Failed to send message").await
    }

    pub async fn list_messages(&self, thread_id: &str) -> Result<ListMessagesResponse, AgentClientError> {
        let response = self
            .client
            .post(format!("{}/api/azure-agent/messages/list", self.base_url))
            .json(&ListMessagesRequest { thread_id })
            .send()
            .await?;
        decode(response, "Failed to list messages").await
    }

    pub async fn health_check(&self) -> Result<AgentHealth, AgentClientError> {
        let response = self.client.get(format!("{}/health", self.base_url)).send().await?;
        if !response.status().is_success() {
            return Err(AgentClientError::Api {
                status: response.status().as_u16(),
                message: "Health check failed".to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    default_message: &str,
) -> Result<T, AgentClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| default_message.to_string());

        tracing::error!(status = status.as_u16(), message = %message, "Agent backend error");
        return Err(AgentClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}
