//! Execution trace of a single agent run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters of a tool observation kept in the rendered log
const MAX_OBSERVATION_CHARS: usize = 2000;

/// Kind of trace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// The goal the run started with
    Goal,
    /// Intermediate text produced by the model alongside tool calls
    Thought,
    /// A tool invocation
    ToolCall,
    /// A tool's result as shown to the model
    Observation,
    /// The final answer
    Answer,
    /// A failure that ended the run or was fed back to the model
    Error,
}

/// One line in the trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: TraceKind,
    /// Tool name for tool calls and observations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub content: String,
}

/// Ordered log of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTrace {
    entries: Vec<TraceEntry>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&mut self, kind: TraceKind, tool: Option<&str>, content: impl Into<String>) {
        self.entries.push(TraceEntry {
            timestamp: Utc::now(),
            kind,
            tool: tool.map(str::to_string),
            content: content.into(),
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tool names invoked, in order
    pub fn tool_calls(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind == TraceKind::ToolCall)
            .filter_map(|e| e.tool.as_deref())
            .collect()
    }

    /// Number of invocations of a given tool
    pub fn count_calls(&self, tool: &str) -> usize {
        self.tool_calls().into_iter().filter(|t| *t == tool).count()
    }

    /// Render the trace as the plain-text log returned to front ends
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let time = entry.timestamp.format("%H:%M:%S");
            let line = match entry.kind {
                TraceKind::Goal => format!("[{}] > Goal: {}", time, entry.content),
                TraceKind::Thought => format!("[{}] {}", time, entry.content),
                TraceKind::ToolCall => format!(
                    "[{}] > Invoking `{}` with {}",
                    time,
                    entry.tool.as_deref().unwrap_or("?"),
                    entry.content
                ),
                TraceKind::Observation => format!(
                    "[{}] < {}: {}",
                    time,
                    entry.tool.as_deref().unwrap_or("?"),
                    truncate(&entry.content, MAX_OBSERVATION_CHARS)
                ),
                TraceKind::Answer => format!("[{}] > Finished: {}", time, entry.content),
                TraceKind::Error => format!("[{}] ! {}", time, entry.content),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... ({} chars)", &s[..idx], s.chars().count()),
        None => s.to_string(),
    }
}
