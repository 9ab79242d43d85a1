//! Entity-to-HTML serializer.
//!
//! Pure and deterministic: the same text and entity list always produce the
//! same HTML. Entities may arrive unsorted; overlapping entities are resolved
//! by letting the earliest-starting one win and silently dropping the rest —
//! no nesting or merging is attempted.

use crate::entity::{EntityKind, MessageEntity};

/// Number of UTF-16 code units in `s`.
///
/// Telegram addresses entity offsets in UTF-16 code units, so every slice the
/// renderer takes must count the same way. Counting `char`s instead silently
/// shifts every annotation that follows an astral-plane codepoint.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Slice `s` by UTF-16 code-unit offset and length, clamping past the end.
///
/// An offset at or beyond the end of the text yields an empty string. A
/// codepoint is included only when both of its units fall inside the range
/// (Telegram never produces offsets that split a surrogate pair).
pub fn utf16_slice(s: &str, offset: usize, length: usize) -> String {
    let end = offset.saturating_add(length);
    let mut pos = 0usize;
    let mut out = String::new();

    for c in s.chars() {
        if pos >= end {
            break;
        }
        let width = c.len_utf16();
        if pos >= offset && pos + width <= end {
            out.push(c);
        }
        pos += width;
    }

    out
}

/// Escape text for embedding in Telegram HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn wrap(tag: &str, attrs: Option<&str>, inner: &str) -> String {
    match attrs {
        Some(attrs) => format!("<{tag} {attrs}>{inner}</{tag}>"),
        None => format!("<{tag}>{inner}</{tag}>"),
    }
}

/// Render `text` with its entities into Telegram HTML.
///
/// Walks the entities in ascending offset order (stable sort, so ties keep
/// their original order) with a cursor over the consumed prefix. An entity
/// starting before the cursor overlaps one already emitted and is dropped.
/// Gaps between entities are emitted escaped; annotated spans are wrapped per
/// kind.
pub fn render_html(text: &str, entities: &[MessageEntity]) -> String {
    if entities.is_empty() {
        return escape(text);
    }

    let mut sorted: Vec<&MessageEntity> = entities.iter().collect();
    sorted.sort_by_key(|e| e.offset);

    let mut out = String::new();
    let mut cursor = 0usize;

    for entity in sorted {
        if entity.offset < cursor {
            continue;
        }

        if entity.offset > cursor {
            out.push_str(&escape(&utf16_slice(text, cursor, entity.offset - cursor)));
        }

        let span = utf16_slice(text, entity.offset, entity.length);
        out.push_str(&render_span(entity, &span));

        cursor = entity.offset + entity.length;
    }

    let total = utf16_len(text);
    if cursor < total {
        out.push_str(&escape(&utf16_slice(text, cursor, total - cursor)));
    }

    out
}

/// Wrap one annotated span per its kind.
///
/// Only `code` and `pre` spans are escaped; the other kinds pass the visible
/// text through untouched, which is what `parse_mode=HTML` expects. An entity
/// missing its kind-specific payload degrades to plain escaped text.
fn render_span(entity: &MessageEntity, span: &str) -> String {
    match entity.kind {
        EntityKind::Bold => wrap("b", None, span),
        EntityKind::Italic => wrap("i", None, span),
        EntityKind::Underline => wrap("u", None, span),
        EntityKind::Strikethrough => wrap("s", None, span),
        EntityKind::Spoiler => wrap("tg-spoiler", None, span),
        EntityKind::Code => wrap("code", None, &escape(span)),
        EntityKind::Pre => match &entity.language {
            Some(language) => wrap(
                "pre",
                Some(&format!("class=\"language-{language}\"")),
                &escape(span),
            ),
            None => wrap("pre", None, &escape(span)),
        },
        EntityKind::TextLink => match &entity.url {
            Some(url) => wrap("a", Some(&format!("href=\"{url}\"")), span),
            None => escape(span),
        },
        EntityKind::TextMention => match &entity.user {
            Some(user) => wrap("a", Some(&format!("href=\"tg://user?id={}\"", user.id)), span),
            None => escape(span),
        },
        EntityKind::CustomEmoji => match &entity.custom_emoji_id {
            Some(id) => wrap("tg-emoji", Some(&format!("emoji-id=\"{id}\"")), span),
            None => escape(span),
        },
        EntityKind::Blockquote => wrap("blockquote", None, span),
        EntityKind::ExpandableBlockquote => wrap("blockquote", Some("expandable"), span),
        EntityKind::Unknown => escape(span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityUser;

    fn entity(kind: EntityKind, offset: usize, length: usize) -> MessageEntity {
        MessageEntity::new(kind, offset, length)
    }

    #[test]
    fn test_utf16_len_counts_surrogate_pairs() {
        assert_eq!(utf16_len("abc"), 3);
        assert_eq!(utf16_len("😊abc"), 5);
        assert_eq!(utf16_len(""), 0);
    }

    #[test]
    fn test_utf16_slice_basic() {
        assert_eq!(utf16_slice("hello world", 6, 5), "world");
        assert_eq!(utf16_slice("hello", 0, 5), "hello");
    }

    #[test]
    fn test_utf16_slice_after_emoji() {
        // The emoji occupies units 0..2, so offset 2 starts right after it.
        assert_eq!(utf16_slice("😊abc", 2, 3), "abc");
        assert_eq!(utf16_slice("😊abc", 0, 2), "😊");
    }

    #[test]
    fn test_utf16_slice_clamps_past_end() {
        assert_eq!(utf16_slice("hi", 0, 100), "hi");
        assert_eq!(utf16_slice("hi", 5, 3), "");
    }

    #[test]
    fn test_no_entities_returns_escaped_text() {
        assert_eq!(render_html("a < b & c > d", &[]), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_bold_after_emoji_uses_unit_offsets() {
        // Bold at offset 2 length 3 must cover exactly "abc", not shift by
        // one codepoint.
        let entities = [entity(EntityKind::Bold, 2, 3)];
        assert_eq!(render_html("😊abc!", &entities), "😊<b>abc</b>!");
    }

    #[test]
    fn test_entity_order_does_not_matter() {
        let text = "one two three";
        let ascending = [
            entity(EntityKind::Bold, 0, 3),
            entity(EntityKind::Italic, 4, 3),
            entity(EntityKind::Underline, 8, 5),
        ];
        let shuffled = [
            ascending[2].clone(),
            ascending[0].clone(),
            ascending[1].clone(),
        ];
        assert_eq!(render_html(text, &ascending), render_html(text, &shuffled));
        assert_eq!(
            render_html(text, &ascending),
            "<b>one</b> <i>two</i> <u>three</u>"
        );
    }

    #[test]
    fn test_overlapping_entity_is_dropped() {
        // The italic starts inside the bold span: earliest-starting wins,
        // the later one disappears entirely.
        let entities = [
            entity(EntityKind::Bold, 0, 5),
            entity(EntityKind::Italic, 3, 4),
        ];
        assert_eq!(render_html("abcdefgh", &entities), "<b>abcde</b>fgh");
    }

    #[test]
    fn test_abutting_entities_have_no_gap() {
        let entities = [
            entity(EntityKind::Bold, 0, 4),
            entity(EntityKind::Italic, 4, 4),
        ];
        assert_eq!(render_html("abcdefgh", &entities), "<b>abcd</b><i>efgh</i>");
    }

    #[test]
    fn test_zero_length_entity_emits_empty_span() {
        let entities = [entity(EntityKind::Bold, 2, 0)];
        assert_eq!(render_html("abcd", &entities), "ab<b></b>cd");
    }

    #[test]
    fn test_entity_past_end_is_clamped() {
        let entities = [entity(EntityKind::Bold, 2, 50)];
        assert_eq!(render_html("abcd", &entities), "ab<b>cd</b>");
    }

    #[test]
    fn test_code_span_is_escaped() {
        let entities = [entity(EntityKind::Code, 0, 6)];
        assert_eq!(render_html("a<b>&c rest", &entities), "<code>a&lt;b&gt;&amp;c</code> rest");
    }

    #[test]
    fn test_pre_with_language() {
        let mut pre = entity(EntityKind::Pre, 0, 9);
        pre.language = Some("rust".into());
        assert_eq!(
            render_html("fn main()", &[pre]),
            "<pre class=\"language-rust\">fn main()</pre>"
        );
    }

    #[test]
    fn test_text_link_and_mention() {
        let mut link = entity(EntityKind::TextLink, 0, 4);
        link.url = Some("https://example.com".into());
        assert_eq!(
            render_html("here", &[link]),
            "<a href=\"https://example.com\">here</a>"
        );

        let mut mention = entity(EntityKind::TextMention, 0, 4);
        mention.user = Some(EntityUser { id: 42 });
        assert_eq!(
            render_html("name", &[mention]),
            "<a href=\"tg://user?id=42\">name</a>"
        );
    }

    #[test]
    fn test_custom_emoji_and_quotes() {
        let mut emoji = entity(EntityKind::CustomEmoji, 0, 2);
        emoji.custom_emoji_id = Some("5368324170671202286".into());
        assert_eq!(
            render_html("😊", &[emoji]),
            "<tg-emoji emoji-id=\"5368324170671202286\">😊</tg-emoji>"
        );

        let quote = entity(EntityKind::Blockquote, 0, 5);
        assert_eq!(render_html("lines", &[quote]), "<blockquote>lines</blockquote>");

        let expandable = entity(EntityKind::ExpandableBlockquote, 0, 5);
        assert_eq!(
            render_html("lines", &[expandable]),
            "<blockquote expandable>lines</blockquote>"
        );
    }

    #[test]
    fn test_unknown_kind_renders_escaped_text() {
        let entities = [entity(EntityKind::Unknown, 0, 4)];
        assert_eq!(render_html("a<b>", &entities), "a&lt;b&gt;");
    }

    #[test]
    fn test_entity_missing_payload_degrades_to_text() {
        // A text_link without a url has nothing to wrap with.
        let entities = [entity(EntityKind::TextLink, 0, 4)];
        assert_eq!(render_html("here", &entities), "here");
    }
}
