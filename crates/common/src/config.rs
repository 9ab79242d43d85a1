use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HeraldError;

/// Operator-editable service configuration, persisted as pretty-printed JSON.
///
/// Every mutation validates its input, applies it, then writes the file back
/// before returning, so the on-disk config always matches what the operator
/// last confirmed. The bot token is never written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Telegram user id allowed to drive the control panel.
    pub admin_id: i64,

    /// Broadcast interval in minutes.
    pub post_minutes: i64,

    /// Pin each freshly delivered message.
    #[serde(default)]
    pub pin: bool,

    /// Delete the previously delivered message before sending a new one.
    #[serde(default)]
    pub remove_last: bool,

    /// Broadcast recipients (chat ids).
    #[serde(default)]
    pub chat_ids: Vec<i64>,

    /// Message body, stored as Telegram HTML.
    #[serde(default)]
    pub message: String,

    /// File id of the photo to broadcast, when the post is a photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_file_id: Option<String>,

    /// Bot token, taken from the `BOT_TOKEN` environment variable.
    #[serde(skip)]
    pub token: String,

    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Load configuration from a JSON file, taking the bot token from the
    /// `BOT_TOKEN` environment variable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HeraldError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;

        let token = std::env::var("BOT_TOKEN").unwrap_or_default();

        Self::parse(&raw, token, path.to_path_buf())
    }

    fn parse(raw: &str, token: String, path: PathBuf) -> Result<Self, HeraldError> {
        let mut config: Config = serde_json::from_str(raw)?;

        if config.admin_id <= 0 {
            return Err(HeraldError::Config(
                "adminId must be greater than 0".into(),
            ));
        }
        if config.post_minutes <= 0 {
            return Err(HeraldError::Config(
                "postMinutes must be greater than 0".into(),
            ));
        }
        if token.trim().is_empty() {
            return Err(HeraldError::Config("BOT_TOKEN must be set".into()));
        }

        config.token = token;
        config.path = path;
        Ok(config)
    }

    /// Write the current configuration back to its file.
    pub fn save(&self) -> Result<(), HeraldError> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    /// Add a chat to the recipient set. Adding an already-known chat is a
    /// no-op that skips the save.
    pub fn add_chat(&mut self, chat_id: i64) -> Result<(), HeraldError> {
        if self.chat_ids.contains(&chat_id) {
            return Ok(());
        }

        self.chat_ids.push(chat_id);
        self.save()
    }

    /// Replace the whole recipient set.
    pub fn reset_chats(&mut self, chat_ids: Vec<i64>) -> Result<(), HeraldError> {
        self.chat_ids = chat_ids;
        self.save()
    }

    /// Change the broadcast interval.
    pub fn set_post_minutes(&mut self, minutes: i64) -> Result<(), HeraldError> {
        if minutes <= 0 {
            return Err(HeraldError::Validation(
                "interval must be greater than 0".into(),
            ));
        }

        self.post_minutes = minutes;
        self.save()
    }

    /// Replace the broadcast message (Telegram HTML) and its optional photo.
    pub fn set_message(
        &mut self,
        message: String,
        photo_file_id: Option<String>,
    ) -> Result<(), HeraldError> {
        if message.trim().is_empty() {
            return Err(HeraldError::Validation("message can not be empty".into()));
        }

        self.message = message;
        self.photo_file_id = photo_file_id;
        self.save()
    }

    pub fn toggle_pin(&mut self) -> Result<(), HeraldError> {
        self.pin = !self.pin;
        self.save()
    }

    pub fn toggle_remove_last(&mut self) -> Result<(), HeraldError> {
        self.remove_last = !self.remove_last;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Config, HeraldError> {
        Config::parse(raw, "test-token".into(), PathBuf::new())
    }

    #[test]
    fn test_parse_minimal() {
        let config = parse(r#"{"adminId": 42, "postMinutes": 30}"#).unwrap();
        assert_eq!(config.admin_id, 42);
        assert_eq!(config.post_minutes, 30);
        assert!(!config.pin);
        assert!(!config.remove_last);
        assert!(config.chat_ids.is_empty());
        assert_eq!(config.token, "test-token");
    }

    #[test]
    fn test_parse_rejects_bad_admin_id() {
        let err = parse(r#"{"adminId": 0, "postMinutes": 30}"#).unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)));
    }

    #[test]
    fn test_parse_rejects_bad_interval() {
        let err = parse(r#"{"adminId": 1, "postMinutes": -5}"#).unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)));
    }

    #[test]
    fn test_parse_rejects_missing_token() {
        let err = Config::parse(
            r#"{"adminId": 1, "postMinutes": 1}"#,
            "  ".into(),
            PathBuf::new(),
        )
        .unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)));
    }

    #[test]
    fn test_set_post_minutes_rejects_invalid_without_change() {
        let mut config = parse(r#"{"adminId": 1, "postMinutes": 10}"#).unwrap();
        assert!(config.set_post_minutes(0).is_err());
        assert_eq!(config.post_minutes, 10);
    }

    #[test]
    fn test_set_message_rejects_empty() {
        let mut config = parse(r#"{"adminId": 1, "postMinutes": 10}"#).unwrap();
        assert!(config.set_message("   ".into(), None).is_err());
        assert_eq!(config.message, "");
    }

    #[test]
    fn test_mutations_persist_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"adminId": 1, "postMinutes": 10}"#).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut config = Config::parse(&raw, "test-token".into(), path.clone()).unwrap();

        config.add_chat(100).unwrap();
        config.add_chat(100).unwrap();
        config.toggle_pin().unwrap();
        config.set_message("<b>hello</b>".into(), None).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let reloaded = Config::parse(&raw, "test-token".into(), path).unwrap();
        assert_eq!(reloaded.chat_ids, vec![100]);
        assert!(reloaded.pin);
        assert_eq!(reloaded.message, "<b>hello</b>");
        // Token must never be serialized.
        assert!(!raw.contains("test-token"));
    }

    #[test]
    fn test_reset_chats_replaces_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"adminId": 1, "postMinutes": 10, "chatIds": [1, 2]}"#).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut config = Config::parse(&raw, "test-token".into(), path).unwrap();
        config.reset_chats(vec![7, 8, 9]).unwrap();
        assert_eq!(config.chat_ids, vec![7, 8, 9]);
    }
}
