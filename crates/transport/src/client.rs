use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::types::{
    AnswerCallbackQuery, ApiResponse, DeleteMessage, Message, PinChatMessage, SendMessage,
    SendPhoto, Update,
};

const API_BASE_URL: &str = "https://api.telegram.org/bot";

/// Request timeout. Generous enough to cover the 30-second long poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(35);

/// Thin client over the Telegram Bot API.
///
/// Holds one reqwest client; its connection pool is safe for concurrent use,
/// so a single `TelegramClient` serves both the update loop and every
/// concurrent broadcast task without extra locking.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{API_BASE_URL}{token}"),
        })
    }

    /// Send a text message, returning the delivered message id.
    pub async fn send_message(&self, req: &SendMessage) -> Result<i64, TransportError> {
        let message: Message = self.call("sendMessage", req).await?;
        Ok(message.message_id)
    }

    /// Send a photo with its caption, returning the delivered message id.
    pub async fn send_photo(&self, req: &SendPhoto) -> Result<i64, TransportError> {
        let message: Message = self.call("sendPhoto", req).await?;
        Ok(message.message_id)
    }

    pub async fn delete_message(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), TransportError> {
        self.call::<bool>(
            "deleteMessage",
            &DeleteMessage {
                chat_id,
                message_id,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn pin_chat_message(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), TransportError> {
        self.call::<bool>(
            "pinChatMessage",
            &PinChatMessage {
                chat_id,
                message_id,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        req: &AnswerCallbackQuery,
    ) -> Result<(), TransportError> {
        self.call::<bool>("answerCallbackQuery", req).await?;
        Ok(())
    }

    /// Long-poll for updates past `offset`. Blocks up to 30 seconds
    /// server-side when no update is pending.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let url = format!("{}/getUpdates?timeout=30&offset={}", self.base_url, offset);
        let response: ApiResponse<Vec<Update>> =
            self.http.get(url).send().await?.json().await?;
        Self::unwrap_response(response)
    }

    /// POST one Bot API method and decode its response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T, TransportError> {
        let url = format!("{}/{}", self.base_url, method);
        let response: ApiResponse<T> =
            self.http.post(url).json(body).send().await?.json().await?;
        Self::unwrap_response(response)
    }

    fn unwrap_response<T>(response: ApiResponse<T>) -> Result<T, TransportError> {
        if !response.ok {
            return Err(TransportError::Api(
                response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        response
            .result
            .ok_or_else(|| TransportError::Api("response missing result".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_response_ok() {
        let response = ApiResponse {
            ok: true,
            description: None,
            result: Some(7i64),
        };
        assert_eq!(TelegramClient::unwrap_response(response).unwrap(), 7);
    }

    #[test]
    fn test_unwrap_response_rejected() {
        let response: ApiResponse<i64> = ApiResponse {
            ok: false,
            description: Some("Forbidden: bot was kicked".to_string()),
            result: None,
        };
        let err = TelegramClient::unwrap_response(response).unwrap_err();
        assert!(matches!(err, TransportError::Api(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_unwrap_response_ok_without_result() {
        let response: ApiResponse<i64> = ApiResponse {
            ok: true,
            description: None,
            result: None,
        };
        assert!(TelegramClient::unwrap_response(response).is_err());
    }
}
