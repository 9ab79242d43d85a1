//! Inline-keyboard control panel for the admin chat.

use herald_transport::TelegramClient;
use herald_transport::error::TransportError;
use herald_transport::types::{InlineKeyboardButton, InlineKeyboardMarkup, SendMessage};

/// Buttons on the control panel, round-tripped through callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Start,
    Stop,
    AddChat,
    ResetChats,
    ChooseInterval,
    ChangeMessage,
    TogglePin,
    ToggleRemoveLast,
}

impl CallbackAction {
    pub fn as_str(self) -> &'static str {
        match self {
            CallbackAction::Start => "start",
            CallbackAction::Stop => "stop",
            CallbackAction::AddChat => "add-chat",
            CallbackAction::ResetChats => "reset-chats",
            CallbackAction::ChooseInterval => "choose-interval",
            CallbackAction::ChangeMessage => "change-message",
            CallbackAction::TogglePin => "pin",
            CallbackAction::ToggleRemoveLast => "remove-last",
        }
    }

    /// Parse callback data back into an action. Unknown data (stale panels
    /// from older versions, for instance) yields `None` and is ignored.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "add-chat" => Some(Self::AddChat),
            "reset-chats" => Some(Self::ResetChats),
            "choose-interval" => Some(Self::ChooseInterval),
            "change-message" => Some(Self::ChangeMessage),
            "pin" => Some(Self::TogglePin),
            "remove-last" => Some(Self::ToggleRemoveLast),
            _ => None,
        }
    }
}

fn row(text: &str, action: CallbackAction) -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton {
        text: text.to_string(),
        callback_data: action.as_str().to_string(),
    }]
}

/// Send the control panel to the admin chat.
pub async fn send_panel(client: &TelegramClient, chat_id: i64) -> Result<(), TransportError> {
    let keyboard = InlineKeyboardMarkup {
        inline_keyboard: vec![
            row("Start", CallbackAction::Start),
            row("Stop", CallbackAction::Stop),
            row("Add chat", CallbackAction::AddChat),
            row("Reset chats", CallbackAction::ResetChats),
            row("Set interval", CallbackAction::ChooseInterval),
            row("Change message", CallbackAction::ChangeMessage),
            row("Toggle pin", CallbackAction::TogglePin),
            row("Toggle delete previous", CallbackAction::ToggleRemoveLast),
        ],
    };

    client
        .send_message(&SendMessage::plain(chat_id, "Choose an action").with_keyboard(keyboard))
        .await?;

    Ok(())
}
