//! Webhook message body handed to sinks.

use serde::Serialize;

/// Mention parsing policy. Relayed text never pings anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowedMentions {
    /// Mention types to parse; empty disables all.
    pub parse: Vec<String>,
}

/// Embed author line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    /// Display name.
    pub name: String,
    /// Link target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Name/value pair shown in an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    /// Label.
    pub name: String,
    /// Value.
    pub value: String,
    /// Whether the field may share a row.
    pub inline: bool,
}

/// Rich embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Embed {
    /// Heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text (markdown).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Heading link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Side bar colour, `0xRRGGBB`.
    #[serde(skip_serializing_if = "Option::is_none", rename = "color")]
    pub colour: Option<u32>,
    /// Author line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    /// Extra fields.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

/// A complete message for one destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payload {
    /// Plain text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Rich embeds.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Mention policy.
    pub allowed_mentions: AllowedMentions,
    /// Display name override for the posting webhook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Payload {
    /// Payload carrying a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Payload carrying plain text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty) && self.embeds.is_empty()
    }
}
