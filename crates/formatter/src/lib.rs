//! Rich-text rendering for broadcast messages.
//!
//! Converts Telegram message entities (formatting annotations addressed in
//! UTF-16 code units) into the HTML that `parse_mode=HTML` expects, and
//! expands spintax alternation blocks for per-cycle message variation.

pub mod entity;
pub mod render;
pub mod spintax;

pub use entity::{EntityKind, EntityUser, MessageEntity};
pub use render::render_html;
