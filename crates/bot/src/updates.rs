//! Long-polling update loop and admin input handling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use herald_common::config::Config;
use herald_engine::{Scheduler, StartOutcome, StopOutcome};
use herald_formatter::render_html;
use herald_transport::TelegramClient;
use herald_transport::types::{AnswerCallbackQuery, CallbackQuery, Message, SendMessage};

use crate::panel::{self, CallbackAction};

/// Backoff after a failed getUpdates poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// What typed input the next admin message is interpreted as.
///
/// A panel button that needs free-form input (a chat id, an interval, a new
/// message) sets this; the next admin message resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingAction {
    None,
    AddChat,
    ResetChats,
    ChooseInterval,
    ChangeMessage,
}

pub struct UpdateLoop {
    config: Arc<RwLock<Config>>,
    client: Arc<TelegramClient>,
    scheduler: Arc<Scheduler<TelegramClient>>,
    pending: PendingAction,
    offset: i64,
}

impl UpdateLoop {
    pub fn new(
        config: Arc<RwLock<Config>>,
        client: Arc<TelegramClient>,
        scheduler: Arc<Scheduler<TelegramClient>>,
    ) -> Self {
        Self {
            config,
            client,
            scheduler,
            pending: PendingAction::None,
            offset: 0,
        }
    }

    /// Poll Telegram for updates indefinitely, dispatching admin input.
    /// Anything from a non-admin user is dropped without a reply.
    pub async fn run(&mut self) {
        let admin_id = self.config.read().await.admin_id;

        loop {
            let updates = match self.client.get_updates(self.offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!(error = %e, transient = e.is_transient(), "Failed to get updates");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                self.offset = update.update_id + 1;

                if let Some(message) = update.message {
                    if message.from.map(|u| u.id) != Some(admin_id) {
                        continue;
                    }
                    self.handle_message(message).await;
                }

                if let Some(callback) = update.callback_query {
                    if callback.from.id != admin_id {
                        continue;
                    }
                    self.handle_callback(callback).await;
                }
            }
        }
    }

    async fn handle_message(&mut self, message: Message) {
        let chat_id = message.chat.id;

        if message.text.as_deref() == Some("/start") {
            self.pending = PendingAction::None;
            self.show_panel(chat_id).await;
            return;
        }

        match self.pending {
            PendingAction::None => {}
            PendingAction::AddChat => self.handle_add_chat(chat_id, &message).await,
            PendingAction::ResetChats => self.handle_reset_chats(chat_id, &message).await,
            PendingAction::ChooseInterval => self.handle_choose_interval(chat_id, &message).await,
            PendingAction::ChangeMessage => self.handle_change_message(chat_id, &message).await,
        }
    }

    async fn handle_callback(&mut self, callback: CallbackQuery) {
        let Some(chat_id) = callback.message.as_ref().map(|m| m.chat.id) else {
            return;
        };
        let Some(action) = callback.data.as_deref().and_then(CallbackAction::parse) else {
            return;
        };

        let mut answer_text = String::new();
        let mut show_alert = false;
        let mut resend_panel = false;

        match action {
            CallbackAction::Start => {
                show_alert = true;
                resend_panel = true;
                let interval = self.config.read().await.post_minutes;
                answer_text = match self.scheduler.start(interval) {
                    StartOutcome::Started => "Autoposting started".to_string(),
                    StartOutcome::AlreadyRunning => "Autoposting is already running".to_string(),
                };
            }
            CallbackAction::Stop => {
                show_alert = true;
                resend_panel = true;
                answer_text = match self.scheduler.stop() {
                    StopOutcome::Stopped => "Autoposting stopped".to_string(),
                    StopOutcome::NotRunning => "Autoposting is not running".to_string(),
                };
            }
            CallbackAction::AddChat => {
                self.pending = PendingAction::AddChat;
                self.reply(chat_id, "Send the chat id to add").await;
            }
            CallbackAction::ResetChats => {
                self.pending = PendingAction::ResetChats;
                self.reply(chat_id, "Send the new chat ids, separated by spaces")
                    .await;
            }
            CallbackAction::ChooseInterval => {
                self.pending = PendingAction::ChooseInterval;
                self.reply(chat_id, "Send the interval in minutes").await;
            }
            CallbackAction::ChangeMessage => {
                self.pending = PendingAction::ChangeMessage;
                self.reply(chat_id, "Send the new broadcast message").await;
            }
            CallbackAction::TogglePin => {
                show_alert = true;
                resend_panel = true;
                let pin = {
                    let mut config = self.config.write().await;
                    config.toggle_pin().map(|_| config.pin)
                };
                answer_text = match pin {
                    Ok(true) => "New messages will be pinned".to_string(),
                    Ok(false) => "New messages will no longer be pinned".to_string(),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to toggle pin");
                        "Failed to toggle pinning".to_string()
                    }
                };
            }
            CallbackAction::ToggleRemoveLast => {
                show_alert = true;
                resend_panel = true;
                let remove_last = {
                    let mut config = self.config.write().await;
                    config.toggle_remove_last().map(|_| config.remove_last)
                };
                answer_text = match remove_last {
                    Ok(true) => "Previous messages will be deleted before each post".to_string(),
                    Ok(false) => "Previous messages will no longer be deleted".to_string(),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to toggle delete-previous");
                        "Failed to toggle deletion".to_string()
                    }
                };
            }
        }

        let answer = AnswerCallbackQuery {
            callback_query_id: callback.id,
            text: answer_text,
            show_alert,
        };
        if let Err(e) = self.client.answer_callback_query(&answer).await {
            tracing::warn!(error = %e, "Failed to answer callback query");
        }

        if resend_panel {
            self.show_panel(chat_id).await;
        }
    }

    async fn handle_add_chat(&mut self, chat_id: i64, message: &Message) {
        let text = message.text.as_deref().unwrap_or_default();
        let Ok(new_chat) = text.trim().parse::<i64>() else {
            self.reply(chat_id, "Invalid chat id, send a numeric id").await;
            self.show_panel(chat_id).await;
            return;
        };

        let result = self.config.write().await.add_chat(new_chat);
        match result {
            Ok(()) => {
                self.reply(chat_id, &format!("Chat {new_chat} added")).await;
            }
            Err(e) => {
                tracing::warn!(chat_id = new_chat, error = %e, "Failed to add chat");
                self.reply(chat_id, "Failed to add chat").await;
            }
        }

        self.pending = PendingAction::None;
        self.show_panel(chat_id).await;
    }

    async fn handle_reset_chats(&mut self, chat_id: i64, message: &Message) {
        let text = message.text.as_deref().unwrap_or_default();
        let parsed: Vec<i64> = text
            .split_whitespace()
            .filter_map(|part| part.parse().ok())
            .collect();

        if parsed.is_empty() {
            self.reply(chat_id, "No valid chat ids found, send numeric ids separated by spaces")
                .await;
            return;
        }

        let result = self.config.write().await.reset_chats(parsed.clone());
        match result {
            Ok(()) => {
                self.reply(chat_id, &format!("Chat list replaced: {parsed:?}"))
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reset chats");
                self.reply(chat_id, "Failed to replace the chat list").await;
            }
        }

        self.pending = PendingAction::None;
        self.show_panel(chat_id).await;
    }

    async fn handle_choose_interval(&mut self, chat_id: i64, message: &Message) {
        let text = message.text.as_deref().unwrap_or_default();
        let minutes = match text.trim().parse::<i64>() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => {
                self.reply(chat_id, "Invalid interval, send a number of minutes greater than 0")
                    .await;
                return;
            }
        };

        let result = self.config.write().await.set_post_minutes(minutes);
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to change interval");
            self.reply(chat_id, "Failed to change the interval").await;
            return;
        }

        // A live schedule picks the new interval up immediately; a stopped
        // one will use it on the next start.
        self.scheduler.reconfigure(minutes);

        self.reply(chat_id, "Broadcast interval updated").await;
        self.pending = PendingAction::None;
        self.show_panel(chat_id).await;
    }

    async fn handle_change_message(&mut self, chat_id: i64, message: &Message) {
        let (text, entities) = if let Some(caption) = &message.caption {
            (caption.clone(), message.caption_entities.as_slice())
        } else {
            (
                message.text.clone().unwrap_or_default(),
                message.entities.as_slice(),
            )
        };

        if text.trim().is_empty() {
            self.reply(chat_id, "Message can not be empty").await;
            return;
        }

        // Largest photo size comes last.
        let photo_file_id = message.photo.last().map(|p| p.file_id.clone());

        let html = render_html(&text, entities);

        let result = self.config.write().await.set_message(html, photo_file_id);
        match result {
            Ok(()) => self.reply(chat_id, "Broadcast message updated").await,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to change message");
                self.reply(chat_id, "Failed to change the message").await;
            }
        }

        self.pending = PendingAction::None;
        self.show_panel(chat_id).await;
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self
            .client
            .send_message(&SendMessage::plain(chat_id, text))
            .await
        {
            tracing::warn!(chat_id, error = %e, "Failed to send reply");
        }
    }

    async fn show_panel(&self, chat_id: i64) {
        if let Err(e) = panel::send_panel(&self.client, chat_id).await {
            tracing::warn!(chat_id, error = %e, "Failed to send control panel");
        }
    }
}
