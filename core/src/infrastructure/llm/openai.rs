// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! OpenAI chat-completions adapter.
//!
//! Translates Ship chat turns into the Chat Completions API with function
//! tools and back. Also works with OpenAI-compatible endpoints (the endpoint
//! is a constructor argument, not a constant).

use crate::domain::llm::{
    ChatMessage, ChatModel, ChatTurn, LlmError, Role, ToolCallRequest, ToolSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize, Default)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Serialize)]
struct WireTool {
    r#type: String,
    function: WireFunction,
}

#[derive(Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    r#type: String,
    function: WireCalledFunction,
}

#[derive(Serialize, Deserialize)]
struct WireCalledFunction {
    name: String,
    /// The API carries arguments as a JSON-encoded string.
    arguments: String,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

impl OpenAiChat {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }

    /// Construct from `OPENAI_API_KEY` in the process environment.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LlmError::Authentication("OPENAI_API_KEY is not set".to_string()))?;
        let endpoint =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(endpoint, api_key, model))
    }

    fn to_wire(messages: &[ChatMessage]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::System => "system".to_string(),
                    Role::User => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                    Role::Tool => "tool".to_string(),
                },
                content: (!m.content.is_empty() || m.tool_calls.is_empty())
                    .then(|| m.content.clone()),
                tool_call_id: m.tool_call_id.clone(),
                tool_calls: (!m.tool_calls.is_empty()).then(|| {
                    m.tool_calls
                        .iter()
                        .map(|c| WireToolCall {
                            id: c.id.clone(),
                            r#type: "function".to_string(),
                            function: WireCalledFunction {
                                name: c.name.clone(),
                                arguments: c.arguments.to_string(),
                            },
                        })
                        .collect()
                }),
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        cancel: &CancellationToken,
    ) -> Result<ChatTurn, LlmError> {
        let request = WireRequest {
            model: self.model.clone(),
            messages: Self::to_wire(messages),
            tools: tools
                .iter()
                .map(|t| WireTool {
                    r#type: "function".to_string(),
                    function: WireFunction {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    },
                })
                .collect(),
            temperature: Some(0.2),
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let send = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            response = send => response.map_err(|e| LlmError::Network(e.to_string()))?,
        };

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 401 || status == 403 {
                LlmError::Authentication(error_text)
            } else if status == 429 {
                LlmError::RateLimit
            } else if status == 404 {
                LlmError::ModelNotFound(self.model.clone())
            } else {
                LlmError::Provider(format!("HTTP {}: {}", status, error_text))
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Provider(format!("Failed to parse response: {}", e)))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Provider("No response from model".into()))?;

        match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                let mut requests = Vec::with_capacity(calls.len());
                for call in calls {
                    let arguments = serde_json::from_str(&call.function.arguments)
                        .unwrap_or(serde_json::Value::Null);
                    requests.push(ToolCallRequest {
                        id: call.id,
                        name: call.function.name,
                        arguments,
                    });
                }
                Ok(ChatTurn::ToolCalls(requests))
            }
            _ => Ok(ChatTurn::Message(choice.message.content.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_with_tools() {
        let request = WireRequest {
            model: "gpt-4o".to_string(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: Some("list instances".to_string()),
                ..Default::default()
            }],
            tools: vec![WireTool {
                r#type: "function".to_string(),
                function: WireFunction {
                    name: "inventory_query".to_string(),
                    description: "Run SQL".to_string(),
                    parameters: serde_json::json!({"type": "object"}),
                },
            }],
            temperature: Some(0.2),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "inventory_query");
    }

    #[test]
    fn test_tools_field_omitted_when_empty() {
        let request = WireRequest {
            model: "gpt-4o".to_string(),
            messages: vec![],
            tools: vec![],
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_tool_call_response_deserialization() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "inventory_query",
                            "arguments": "{\"sql\":\"SELECT 1\",\"provider\":\"aws\"}"
                        }
                    }]
                }
            }]
        });

        let response: WireResponse = serde_json::from_value(json).unwrap();
        let calls = response.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "inventory_query");

        let arguments: serde_json::Value =
            serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(arguments["provider"], "aws");
    }

    #[test]
    fn test_plain_message_deserialization() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "All instances are encrypted."
                }
            }]
        });
        let response: WireResponse = serde_json::from_value(json).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("All instances are encrypted.")
        );
        assert!(response.choices[0].message.tool_calls.is_none());
    }

    #[test]
    fn test_message_translation_for_tool_turns() {
        let messages = vec![
            ChatMessage::assistant_tool_calls(vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "inventory_query".to_string(),
                arguments: serde_json::json!({"sql": "SELECT 1"}),
            }]),
            ChatMessage::tool_observation("call_1", "[{\"n\": 1}]"),
        ];

        let wire = OpenAiChat::to_wire(&messages);
        assert_eq!(wire[0].role, "assistant");
        assert!(wire[0].tool_calls.is_some());
        assert_eq!(wire[1].role, "tool");
        assert_eq!(wire[1].tool_call_id.as_deref(), Some("call_1"));
    }
}
