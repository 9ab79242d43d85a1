//! Spintax expansion for per-cycle message variation.

use rand::Rng;

/// Expand spintax alternation blocks: `{a|b|c}` becomes one of its options.
///
/// The innermost block resolves first (the last `{` in the string), so nested
/// blocks like `{x|{y|z}}` collapse from the inside out. Text without a
/// matching `{`/`}` pair is left as-is from the point resolution stops.
pub fn expand(input: &str, rng: &mut impl Rng) -> String {
    let mut text = input.to_string();

    loop {
        let Some(start) = text.rfind('{') else {
            break;
        };
        let Some(close) = text[start..].find('}') else {
            break;
        };
        let end = start + close;

        let options: Vec<&str> = text[start + 1..end].split('|').collect();
        let choice = options[rng.random_range(0..options.len())].to_string();

        text.replace_range(start..=end, &choice);
    }

    text
}
