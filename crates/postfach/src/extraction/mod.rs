//! Format parsers that turn container bytes into [`crate::types::EmailRecord`]s.
//!
//! PDFs go through [`crate::pdf`] and the thread splitter instead; this
//! module covers the formats that carry their own message structure.

pub mod attachment;
#[cfg(feature = "email")]
pub mod email;
pub mod html;
pub mod msg;

pub use attachment::AttachmentExtractor;
#[cfg(feature = "email")]
pub use email::parse_eml;
pub use html::html_to_text;
pub use msg::{MsgOutput, MsgParser};
