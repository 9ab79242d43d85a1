use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Last-delivered message id per chat, used for delete-before-resend.
///
/// Shared by every concurrent send within a cycle; the lock is scoped to a
/// single map access and never held across an await. Contents do not survive
/// a restart — the first cycle after boot simply has nothing to delete.
#[derive(Debug, Default)]
pub struct DeliveryState {
    last_message: Mutex<HashMap<i64, i64>>,
}

impl DeliveryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message id of the previous broadcast in `chat_id`, if any.
    pub fn last_message(&self, chat_id: i64) -> Option<i64> {
        self.map().get(&chat_id).copied()
    }

    /// Record a confirmed delivery.
    pub fn record(&self, chat_id: i64, message_id: i64) {
        self.map().insert(chat_id, message_id);
    }

    /// Number of chats with a recorded delivery.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<i64, i64>> {
        self.last_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
