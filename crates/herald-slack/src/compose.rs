//! Status tiles and plain message composition.
//!
//! Composition is pure: the same input always yields the same payload.

use std::str::FromStr;

#[cfg(feature = "config")]
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::blocks::{Attachment, Block, Text};
use crate::request::MessagePayload;

/// Maximum number of fields rendered in a section block.
pub const MAX_SECTION_FIELDS: usize = 10;

/// Rendered in place of an absent field value.
pub const FIELD_PLACEHOLDER: &str = "N/A";

/// Sidebar color for each status.
pub const STATUS_COLORS: [(Status, &str); 5] = [
    (Status::Success, "good"),
    (Status::Failure, "#e01e5a"),
    (Status::Unstable, "#ffcc00"),
    (Status::Aborted, "#9e9e9e"),
    (Status::Info, "#4a154b"),
];

/// Keyword stems inferring a status from free text, checked in order.
const STATUS_KEYWORDS: [(Status, &[&str]); 3] = [
    (Status::Success, &["succe", "ok", "pass"]),
    (Status::Failure, &["fail", "error", "critical"]),
    (Status::Unstable, &["warn"]),
];

/// Outcome of a pipeline run, as shown on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "config", value(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Status {
    Success,
    Failure,
    Unstable,
    Aborted,
    #[default]
    Info,
}

impl Status {
    /// Parses a status label, falling back to [`Status::Info`] for unknown labels.
    pub fn from_label(label: &str) -> Self {
        <Self as FromStr>::from_str(label.trim()).unwrap_or_default()
    }

    /// Returns the sidebar color of this status.
    pub fn color(self) -> &'static str {
        STATUS_COLORS
            .iter()
            .find(|(status, _)| *status == self)
            .map_or(STATUS_COLORS[4].1, |&(_, color)| color)
    }

    /// Infers a status from keywords in free text.
    ///
    /// A word matches when it starts with a keyword stem, so "failure" and
    /// "warnings" count while "token" does not. Matching is case-insensitive;
    /// success stems are checked first, then failure, then warning. Text with
    /// no keyword is [`Status::Info`].
    pub fn infer(text: &str) -> Self {
        let text = text.to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();

        STATUS_KEYWORDS
            .iter()
            .find(|(_, stems)| {
                words
                    .iter()
                    .any(|word| stems.iter().any(|stem| word.starts_with(stem)))
            })
            .map_or(Self::Info, |(status, _)| *status)
    }
}

/// Broadcast directive prepended to the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Mention {
    #[default]
    None,
    Here,
    Channel,
}

impl Mention {
    /// Returns the token prepended to the text, including its trailing space.
    pub const fn token(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Here => "<!here> ",
            Self::Channel => "<!channel> ",
        }
    }
}

/// A labeled tile field whose value may be absent.
pub type Field = (String, Option<String>);

/// Composes a status tile.
///
/// The tile is a header with `title`, a section with at most
/// [`MAX_SECTION_FIELDS`] fields in their original order, and, when
/// `context_lines` is non-empty, a divider followed by a context block. The
/// status color is carried by a single attachment; the payload has no text.
pub fn compose<S: AsRef<str>>(
    title: &str,
    status_label: &str,
    fields: &[Field],
    context_lines: &[S],
) -> MessagePayload {
    let status = Status::from_label(status_label);

    let fields = fields
        .iter()
        .take(MAX_SECTION_FIELDS)
        .map(|(label, value)| {
            let value = value.as_deref().unwrap_or(FIELD_PLACEHOLDER);
            Text::markdown(format!("*{label}:*\n{value}"))
        })
        .collect();

    let mut blocks = vec![Block::header(title), Block::fields(fields)];
    if !context_lines.is_empty() {
        blocks.push(Block::Divider);
        blocks.push(Block::context(
            context_lines.iter().map(|line| line.as_ref().to_owned()),
        ));
    }

    MessagePayload::new()
        .with_blocks(blocks)
        .with_attachments(vec![Attachment::color(status.color())])
}

/// Composes a plain text message with the status color as sidebar.
pub fn compose_message(text: &str, status: Status) -> MessagePayload {
    MessagePayload::text(text).with_attachments(vec![Attachment::color(status.color())])
}
