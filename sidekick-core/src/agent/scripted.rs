//! Scripted chat model
//!
//! Replays a fixed list of replies, one per decision step. Lets the agent
//! loop be exercised deterministically without a language model.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::model::{ChatModel, Message, ModelReply, ToolCall};
use crate::tool::ToolDefinition;
use crate::{Error, Result};

enum Step {
    Reply(ModelReply),
    Fail(String),
}

/// A [`ChatModel`] that returns pre-recorded replies in order
#[derive(Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    transcripts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply requesting a single tool call
    pub fn then_call(self, name: &str, arguments: serde_json::Value) -> Self {
        let id = format!("call_{}", self.steps.lock().len());
        self.then_reply(ModelReply::calls(vec![ToolCall::new(
            id,
            name,
            arguments.to_string(),
        )]))
    }

    /// Queue a final answer
    pub fn then_answer(self, answer: impl Into<String>) -> Self {
        self.then_reply(ModelReply::answer(answer))
    }

    /// Queue an arbitrary reply
    pub fn then_reply(self, reply: ModelReply) -> Self {
        self.steps.lock().push_back(Step::Reply(reply));
        self
    }

    /// Queue a model failure
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.steps.lock().push_back(Step::Fail(message.into()));
        self
    }

    /// Number of decision steps taken so far
    pub fn calls(&self) -> usize {
        self.transcripts.lock().len()
    }

    /// Conversation seen at each decision step
    pub fn transcripts(&self) -> Vec<Vec<Message>> {
        self.transcripts.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(&self, messages: &[Message], _tools: &[ToolDefinition]) -> Result<ModelReply> {
        self.transcripts.lock().push(messages.to_vec());

        match self.steps.lock().pop_front() {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Fail(message)) => Err(Error::Llm(message)),
            None => Err(Error::Llm("scripted model has no replies left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order() {
        let model = ScriptedModel::new()
            .then_call("read_file", json!({"path": "a"}))
            .then_answer("done");

        let first = model.decide(&[Message::user("go")], &[]).await.unwrap();
        assert_eq!(first.tool_calls[0].name, "read_file");
        assert_eq!(first.tool_calls[0].id, "call_0");

        let second = model.decide(&[], &[]).await.unwrap();
        assert_eq!(second.content.as_deref(), Some("done"));

        assert!(model.decide(&[], &[]).await.is_err());
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_step() {
        let model = ScriptedModel::new().then_fail("quota exceeded");
        let err = model.decide(&[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}
