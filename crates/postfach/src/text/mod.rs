pub mod encoding;
pub mod normalize;
pub mod thread;

pub use encoding::{DecodedText, decode_first_printable};
pub use normalize::normalize_text;
pub use thread::{extract_fields, split_into_records, split_threads};
