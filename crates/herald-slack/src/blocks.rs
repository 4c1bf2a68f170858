//! Typed Block Kit elements carried by message payloads.

use serde::{Deserialize, Serialize};

/// A layout block rendered by the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Large bold title line.
    Header {
        /// Header text, must be plain text.
        text: Text,
    },
    /// Text paragraph and/or a two-column grid of fields.
    Section {
        /// Paragraph text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        /// Grid fields, rendered two per row.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
    },
    /// Horizontal rule.
    Divider,
    /// Small muted line of text elements.
    Context {
        /// Context elements.
        elements: Vec<Text>,
    },
}

impl Block {
    /// Creates a header block with emoji rendering enabled.
    pub fn header(text: impl Into<String>) -> Self {
        Self::Header {
            text: Text::plain(text),
        }
    }

    /// Creates a section block holding only fields.
    pub fn fields(fields: Vec<Text>) -> Self {
        Self::Section { text: None, fields }
    }

    /// Creates a context block with one markdown element per line.
    pub fn context<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Context {
            elements: lines.into_iter().map(Text::markdown).collect(),
        }
    }
}

/// A text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Text {
    /// Text rendered verbatim.
    #[serde(rename = "plain_text")]
    Plain {
        /// Text content.
        text: String,
        /// Whether `:emoji:` codes are rendered.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
    /// Text rendered with mrkdwn formatting.
    #[serde(rename = "mrkdwn")]
    Markdown {
        /// Text content.
        text: String,
    },
}

impl Text {
    /// Creates a plain text object with emoji rendering enabled.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain {
            text: text.into(),
            emoji: Some(true),
        }
    }

    /// Creates a mrkdwn text object.
    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Markdown { text: text.into() }
    }

    /// Returns the text content.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain { text, .. } | Self::Markdown { text } => text.as_str(),
        }
    }
}

/// A legacy attachment, used for the colored sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Sidebar color: a hex code or one of `good`, `warning`, `danger`.
    pub color: String,
}

impl Attachment {
    /// Creates a color-only attachment.
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_block_wire_shape() {
        let blocks = vec![
            Block::header("Build"),
            Block::fields(vec![Text::markdown("*Job:*\nweb")]),
            Block::Divider,
            Block::context(["done"]),
        ];

        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([
                {"type": "header", "text": {"type": "plain_text", "text": "Build", "emoji": true}},
                {"type": "section", "fields": [{"type": "mrkdwn", "text": "*Job:*\nweb"}]},
                {"type": "divider"},
                {"type": "context", "elements": [{"type": "mrkdwn", "text": "done"}]},
            ])
        );
    }

    #[test]
    fn test_color_attachment_wire_shape() {
        let attachment = Attachment::color("good");
        assert_eq!(
            serde_json::to_value(&attachment).unwrap(),
            json!({"color": "good"})
        );
    }
}
