//! Decoding of `\uXXXX` escapes left in answer text

use once_cell::sync::Lazy;
use regex::Regex;

/// A run of consecutive `\uXXXX` escapes. Runs are decoded together so
/// surrogate pairs survive.
static ESCAPE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\\u[0-9a-fA-F]{4})+").expect("valid escape regex"));

/// Replace literal `\uXXXX` sequences with the characters they encode.
///
/// Unpaired surrogates decode to U+FFFD. Text without escapes is returned
/// unchanged.
pub fn unescape_unicode(text: &str) -> String {
    if !text.contains("\\u") {
        return text.to_string();
    }

    ESCAPE_RUN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let units = caps[0]
                .split("\\u")
                .filter(|hex| !hex.is_empty())
                .filter_map(|hex| u16::from_str_radix(hex, 16).ok());
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect::<String>()
        })
        .into_owned()
}
