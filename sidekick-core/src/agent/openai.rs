//! OpenAI-compatible chat-completion adapter
//!
//! Works with any endpoint that follows the `/chat/completions` contract
//! with function tools: OpenAI, Gemini's OpenAI-compatible endpoint,
//! Ollama, vLLM, and similar.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::model::{ChatModel, Message, ModelReply, Role, ToolCall};
use crate::config::AgentConfig;
use crate::tool::ToolDefinition;
use crate::{Error, Result};

/// Chat model backed by an OpenAI-compatible HTTP API
pub struct OpenAiCompatModel {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatModel {
    /// Create a model client
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            client,
        })
    }

    /// Create a model client from the agent configuration
    pub fn from_config(config: &AgentConfig, api_key: Option<String>) -> Result<Self> {
        Self::new(&config.base_url, api_key, &config.model, config.timeout)
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body(&self, messages: &[Message], tools: &[ToolDefinition]) -> Value {
        let messages: Vec<Value> = messages.iter().map(message_to_wire).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        if !tools.is_empty() {
            let tools: Vec<Value> = tools.iter().map(tool_to_wire).collect();
            body["tools"] = Value::Array(tools);
        }

        body
    }
}

impl std::fmt::Debug for OpenAiCompatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatModel")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn decide(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ModelReply> {
        let url = self.chat_url();
        let body = self.build_body(messages, tools);

        debug!(model = %self.model, url = %url, messages = messages.len(), "chat completion request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Llm(format!("HTTP {} - {}", status.as_u16(), text)));
        }

        parse_chat_response(&text)
    }
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn message_to_wire(message: &Message) -> Value {
    match message.role {
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id.clone().unwrap_or_default(),
            "content": message.content.clone().unwrap_or_default(),
        }),
        Role::Assistant if !message.tool_calls.is_empty() => {
            let calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments,
                        }
                    })
                })
                .collect();
            json!({
                "role": "assistant",
                "content": message.content,
                "tool_calls": calls,
            })
        }
        role => json!({
            "role": role_to_str(role),
            "content": message.content.clone().unwrap_or_default(),
        }),
    }
}

fn tool_to_wire(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

fn parse_chat_response(body: &str) -> Result<ModelReply> {
    let completion: ChatCompletion = serde_json::from_str(body)?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Llm("no choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, call)| ToolCall {
            // some compatible endpoints omit ids
            id: call
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", index)),
            name: call.function.name,
            arguments: call.function.arguments.unwrap_or_else(|| "{}".to_string()),
        })
        .collect();

    Ok(ModelReply {
        content: choice.message.content.filter(|c| !c.is_empty()),
        tool_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> OpenAiCompatModel {
        OpenAiCompatModel::new(
            "https://example.com/v1/",
            Some("key".to_string()),
            "test-model",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_chat_url_trims_slash() {
        assert_eq!(model().chat_url(), "https://example.com/v1/chat/completions");
    }

    #[test]
    fn test_build_body() {
        let messages = vec![
            Message::user("read README.md"),
            Message::assistant(
                None,
                vec![ToolCall::new("call_1", "read_file", r#"{"repo_name":"a/b"}"#)],
            ),
            Message::tool("call_1", "Hello"),
        ];
        let tools = vec![ToolDefinition {
            name: "read_file".to_string(),
            description: "Read a file".to_string(),
            parameters: json!({"type": "object"}),
        }];

        let body = model().build_body(&messages, &tools);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["tool_calls"][0]["function"]["name"], "read_file");
        assert_eq!(body["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "read_file");
    }

    #[test]
    fn test_build_body_without_tools() {
        let body = model().build_body(&[Message::user("hi")], &[]);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_final_answer() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"},"finish_reason":"stop"}]}"#;
        let reply = parse_chat_response(body).unwrap();
        assert_eq!(reply.content.as_deref(), Some("Hello"));
        assert!(!reply.has_tool_calls());
    }

    #[test]
    fn test_parse_tool_calls() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null,"tool_calls":[
            {"id":"call_a","type":"function","function":{"name":"list_repository_files","arguments":"{\"repo_name\":\"a/b\"}"}},
            {"type":"function","function":{"name":"read_file"}}
        ]}}]}"#;
        let reply = parse_chat_response(body).unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].id, "call_a");
        assert_eq!(reply.tool_calls[0].arguments, r#"{"repo_name":"a/b"}"#);
        assert_eq!(reply.tool_calls[1].id, "call_1");
        assert_eq!(reply.tool_calls[1].arguments, "{}");
    }

    #[test]
    fn test_parse_no_choices() {
        let err = parse_chat_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
