//! One broadcast cycle: batched, concurrently fanned-out delivery.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use herald_common::types::BroadcastContent;
use herald_transport::client::TelegramClient;
use herald_transport::error::TransportError;
use herald_transport::types::{SendMessage, SendPhoto};

use crate::state::DeliveryState;

/// Recipients dispatched concurrently per batch.
pub const BATCH_SIZE: usize = 10;

/// Pause between batches, a concession to Telegram's throughput limits.
pub const BATCH_PAUSE: Duration = Duration::from_secs(2);

/// Delivery operations a broadcast cycle needs from the platform.
///
/// [`TelegramClient`] is the production implementation; tests substitute an
/// in-memory fake to script per-chat failures.
pub trait BroadcastTransport: Send + Sync {
    fn send_text(
        &self,
        chat_id: i64,
        html: &str,
    ) -> impl Future<Output = Result<i64, TransportError>> + Send;

    fn send_media(
        &self,
        chat_id: i64,
        file_id: &str,
        caption_html: &str,
    ) -> impl Future<Output = Result<i64, TransportError>> + Send;

    fn delete(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn pin(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl BroadcastTransport for TelegramClient {
    async fn send_text(&self, chat_id: i64, html: &str) -> Result<i64, TransportError> {
        self.send_message(&SendMessage::html(chat_id, html)).await
    }

    async fn send_media(
        &self,
        chat_id: i64,
        file_id: &str,
        caption_html: &str,
    ) -> Result<i64, TransportError> {
        self.send_photo(&SendPhoto::html(chat_id, file_id, caption_html))
            .await
    }

    async fn delete(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        self.delete_message(chat_id, message_id).await
    }

    async fn pin(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        self.pin_chat_message(chat_id, message_id).await
    }
}

/// Outcome counts for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sent: usize,
    pub failed: usize,
}

/// Drives one broadcast cycle over the full recipient list.
pub struct FanoutExecutor<T: BroadcastTransport> {
    transport: Arc<T>,
    state: Arc<DeliveryState>,
}

impl<T: BroadcastTransport> FanoutExecutor<T> {
    pub fn new(transport: Arc<T>, state: Arc<DeliveryState>) -> Self {
        Self { transport, state }
    }

    /// Deliver `content` to every chat, in batches of [`BATCH_SIZE`].
    ///
    /// Batches run strictly in order — the next one starts only after every
    /// task of the previous one finished — with a [`BATCH_PAUSE`] between
    /// them and none after the last. Chats within a batch run concurrently;
    /// a chat's failure is logged and isolated, it never disturbs the rest
    /// of the batch or the cycle.
    pub async fn run_cycle(&self, content: &BroadcastContent, chat_ids: &[i64]) -> CycleReport {
        let mut report = CycleReport::default();
        let batch_count = chat_ids.chunks(BATCH_SIZE).count();

        for (index, batch) in chat_ids.chunks(BATCH_SIZE).enumerate() {
            let delivered = join_all(
                batch
                    .iter()
                    .map(|&chat_id| self.deliver(content, chat_id)),
            )
            .await;

            for ok in delivered {
                if ok {
                    report.sent += 1;
                } else {
                    report.failed += 1;
                }
            }

            if index + 1 < batch_count {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            batches = batch_count,
            "Broadcast cycle finished"
        );

        report
    }

    /// Deliver to a single chat. Returns whether the send itself succeeded;
    /// delete and pin are best-effort and only logged.
    async fn deliver(&self, content: &BroadcastContent, chat_id: i64) -> bool {
        if content.remove_last {
            if let Some(message_id) = self.state.last_message(chat_id) {
                if let Err(e) = self.transport.delete(chat_id, message_id).await {
                    tracing::warn!(
                        chat_id,
                        message_id,
                        error = %e,
                        transient = e.is_transient(),
                        "Failed to delete previous message"
                    );
                }
            }
        }

        let sent = match &content.photo_file_id {
            Some(file_id) => self.transport.send_media(chat_id, file_id, &content.text).await,
            None => self.transport.send_text(chat_id, &content.text).await,
        };

        let message_id = match sent {
            Ok(message_id) => message_id,
            Err(e) => {
                tracing::error!(
                    chat_id,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to send broadcast"
                );
                return false;
            }
        };

        self.state.record(chat_id, message_id);

        if content.pin {
            if let Err(e) = self.transport.pin(chat_id, message_id).await {
                tracing::warn!(
                    chat_id,
                    message_id,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to pin message"
                );
            }
        }

        true
    }
}
