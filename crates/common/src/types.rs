use serde::{Deserialize, Serialize};

/// Immutable snapshot of what one broadcast cycle delivers.
///
/// Built from the live configuration at the top of each cycle, so operator
/// edits landing mid-cycle never tear a broadcast in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastContent {
    /// Message body, already rendered to Telegram HTML.
    pub text: String,

    /// Telegram file id of the photo to send, when the broadcast is a photo
    /// post. The body becomes the caption in that case.
    pub photo_file_id: Option<String>,

    /// Pin the freshly delivered message in each chat.
    pub pin: bool,

    /// Delete the previously delivered message in each chat before sending.
    pub remove_last: bool,
}
