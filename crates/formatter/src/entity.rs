use serde::{Deserialize, Serialize};

/// Formatting entity kinds Telegram attaches to a message.
///
/// Closed set; any kind the API grows later deserializes as
/// [`EntityKind::Unknown`] and renders as plain escaped text, never as an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
    Pre,
    TextLink,
    TextMention,
    CustomEmoji,
    Blockquote,
    ExpandableBlockquote,
    #[serde(other)]
    Unknown,
}

/// A user referenced by a `text_mention` entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUser {
    pub id: i64,
}

/// One formatting annotation over a range of a message body.
///
/// `offset` and `length` count UTF-16 code units of the original text, per
/// the Bot API convention — not codepoints and not bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityKind,

    /// Start of the annotated range, in UTF-16 code units.
    pub offset: usize,

    /// Length of the annotated range, in UTF-16 code units.
    pub length: usize,

    /// Target of a `text_link` entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Target of a `text_mention` entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<EntityUser>,

    /// Language tag of a `pre` entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Emoji id of a `custom_emoji` entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emoji_id: Option<String>,
}

impl MessageEntity {
    /// Bare entity of the given kind and range, without a payload.
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
        }
    }
}
