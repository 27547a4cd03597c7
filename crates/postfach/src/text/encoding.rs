//! Text recovery from byte buffers of unknown encoding.

use encoding_rs::{Encoding, UTF_8, UTF_16LE, WINDOWS_1252};

/// Encodings tried, in order, when nothing declares one. WINDOWS_1252 covers
/// both Latin-1 and CP1252 since WHATWG maps the Latin-1 label onto it.
pub static CANDIDATE_ENCODINGS: [&Encoding; 3] = [UTF_8, WINDOWS_1252, UTF_16LE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

/// Decode `bytes`, dropping anything that does not decode.
pub fn decode_ignoring_errors(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
    text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect()
}

/// Printable view of decoded binary content.
///
/// NULs vanish (so UTF-16 ASCII read as single bytes becomes plain ASCII) and
/// other control characters become line breaks; tabs and newlines survive.
pub fn printable(text: &str) -> String {
    text.chars()
        .filter(|&c| c != '\0')
        .map(|c| if c.is_control() && !matches!(c, '\n' | '\r' | '\t') { '\n' } else { c })
        .collect()
}

/// First candidate encoding whose printable output is not blank.
pub fn decode_first_printable(bytes: &[u8]) -> Option<DecodedText> {
    CANDIDATE_ENCODINGS.iter().find_map(|&encoding| {
        let text = printable(&decode_ignoring_errors(bytes, encoding));
        if text.trim().is_empty() {
            tracing::debug!(encoding = encoding.name(), "Candidate encoding produced no printable text");
            None
        } else {
            Some(DecodedText {
                text,
                encoding: encoding.name(),
            })
        }
    })
}

/// UTF-16LE string property, without trailing NUL terminators.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let (text, _) = UTF_16LE.decode_without_bom_handling(bytes);
    text.trim_end_matches('\0').to_string()
}

/// Share of alphabetic characters in `line`, 0.0 for an empty line.
pub fn alpha_ratio(line: &str) -> f64 {
    let total = line.chars().count();
    if total == 0 {
        return 0.0;
    }
    let alpha = line.chars().filter(|c| c.is_alphabetic()).count();
    alpha as f64 / total as f64
}
