//! Rich-content blocks for event and blog bodies.
//!
//! The CMS delivers description content in three shapes: plain strings,
//! JSON-encoded strings, and already-structured objects. The shape is resolved
//! exactly once here, at the deserialization boundary; downstream code only
//! ever sees the tagged `ContentBlock` variants.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::strip_html;

/// One block of event/blog body content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentBlock {
    PlainText(String),
    Structured(StructuredBlock),
}

/// A structured CMS block: a typed section with text and optional list items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl ContentBlock {
    /// Resolve a raw JSON value into a block. Total: anything that is not a
    /// recognizable structured block degrades to `PlainText`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Self::from_text(s),
            Value::Object(_) => match serde_json::from_value::<StructuredBlock>(value.clone()) {
                Ok(block) => ContentBlock::Structured(block),
                Err(_) => ContentBlock::PlainText(value.to_string()),
            },
            other => ContentBlock::PlainText(other.to_string()),
        }
    }

    // A string payload may itself be a JSON-encoded structured block.
    fn from_text(s: String) -> Self {
        if s.trim_start().starts_with('{') {
            if let Ok(block) = serde_json::from_str::<StructuredBlock>(&s) {
                return ContentBlock::Structured(block);
            }
        }
        ContentBlock::PlainText(s)
    }

    /// Flattened text content, with any markup stripped. Used for previews
    /// and search.
    pub fn plain_text(&self) -> String {
        match self {
            ContentBlock::PlainText(s) => strip_html(s),
            ContentBlock::Structured(block) => {
                let mut parts = vec![block.text.clone()];
                parts.extend(block.items.iter().cloned());
                strip_html(&parts.join(" "))
            }
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

/// Deserialize a body field that may be absent, a single value, or a list of
/// blocks.
pub fn deserialize_blocks<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ContentBlock>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.into_iter().map(ContentBlock::from_value).collect()),
        other => Ok(vec![ContentBlock::from_value(other)]),
    }
}

// ============================================================================
// Tests
// ============================================================================
