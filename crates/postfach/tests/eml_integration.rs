//! `.eml` extraction integration tests.
//!
//! Validates header decoding, body assembly and attachment text through the
//! public `Extractor` entry points.

#![cfg(feature = "email")]

use postfach::core::config::{AttachmentConfig, ExtractorConfig};
use postfach::{DocumentFormat, NOT_FOUND, ParsingMethod};

mod helpers;
use helpers::offline_extractor;

const THREAD_EML: &[u8] = b"From: \"Ops Team\" <ops@example.com>\r\n\
To: dev@example.com\r\n\
Subject: Maintenance window\r\n\
Date: Wed, 2 Jul 2025 18:30:00 +0200\r\n\
Message-ID: <mw-7@example.com>\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Databases go read-only on Saturday.\r\n\
--b1\r\n\
Content-Type: text/html; name=\"schedule.html\"\r\n\
Content-Disposition: attachment; filename=\"schedule.html\"\r\n\
\r\n\
<html><body><h1>Schedule</h1><p>Start at 22:00 UTC</p></body></html>\r\n\
--b1\r\n\
Content-Type: image/png; name=\"diagram.png\"\r\n\
Content-Disposition: attachment; filename=\"diagram.png\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
iVBORw0KGgo=\r\n\
--b1--\r\n";

#[test]
fn test_headers_and_diagnostics() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let result = extractor.extract_bytes(THREAD_EML, "maintenance.eml").unwrap();

    assert!(result.success);
    assert_eq!(result.format, DocumentFormat::Eml);
    assert_eq!(result.email_count(), 1);
    assert_eq!(result.diagnostics.parsing_method, Some(ParsingMethod::MimeStructure));
    assert_eq!(result.diagnostics.attachments_count, 2);

    let email = &result.emails[0];
    assert_eq!(email.subject, "Maintenance window");
    assert_eq!(email.sender, "Ops Team <ops@example.com>");
    assert_eq!(email.recipient, "dev@example.com");
    assert_eq!(email.cc, NOT_FOUND);
    assert_eq!(email.message_id, "mw-7@example.com");
    assert_eq!(email.date, "Wed, 2 Jul 2025 18:30:00 +0200");
}

#[test]
fn test_attachment_text_appended_to_content() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let result = extractor.extract_bytes(THREAD_EML, "maintenance.eml").unwrap();
    let email = &result.emails[0];

    assert!(email.content.starts_with("Databases go read-only on Saturday."));
    assert!(email.content.contains("--- Attachment: schedule.html ---"));
    assert!(email.content.contains("Start at 22:00 UTC"));

    let image = email.attachments.iter().find(|a| a.filename == "diagram.png").unwrap();
    assert_eq!(image.content_type, "image/png");
    assert!(image.extracted_text.is_none());
    assert!(!email.attachment_contents.contains_key("diagram.png"));
}

#[test]
fn test_attachment_extraction_can_be_disabled() {
    let config = ExtractorConfig {
        attachments: AttachmentConfig {
            extract_text: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let extractor = offline_extractor(config);
    let result = extractor.extract_bytes(THREAD_EML, "maintenance.eml").unwrap();
    let email = &result.emails[0];
    assert_eq!(email.attachments.len(), 2);
    assert!(email.attachment_contents.is_empty());
    assert!(!email.content.contains("--- Attachment:"));
}

#[test]
fn test_html_only_message() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let eml = b"From: news@example.com\r\n\
Subject: Newsletter\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><head><style>p { color: red; }</style></head><body><p>Big launch next week</p></body></html>\r\n";

    let result = extractor.extract_bytes(eml, "news.EML").unwrap();
    let content = &result.emails[0].content;
    assert!(content.contains("Big launch next week"));
    assert!(!content.contains("color: red"));
    assert!(!content.contains("<p>"));
}

#[test]
fn test_empty_eml_is_error_record() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let result = extractor.extract_bytes_record(b"\r\n\r\n", "empty.eml");
    assert!(!result.success);
    assert_eq!(result.format, DocumentFormat::Eml);
    assert_eq!(result.error.unwrap().kind, "validation");
}

#[cfg(feature = "pdf")]
#[test]
fn test_pdf_attachment_is_extracted() {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let pdf = helpers::pdf_with_pages(&["Invoice total is due on Friday"]);
    let mut eml = String::from(
        "From: billing@example.com\r\n\
Subject: Invoice\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"b2\"\r\n\
\r\n\
--b2\r\n\
Content-Type: text/plain\r\n\
\r\n\
See attached.\r\n\
--b2\r\n\
Content-Type: application/pdf; name=\"invoice.pdf\"\r\n\
Content-Disposition: attachment; filename=\"invoice.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n",
    );
    let encoded = STANDARD.encode(&pdf);
    for line in encoded.as_bytes().chunks(76) {
        eml.push_str(std::str::from_utf8(line).unwrap());
        eml.push_str("\r\n");
    }
    eml.push_str("--b2--\r\n");

    let extractor = offline_extractor(ExtractorConfig::default());
    let result = extractor.extract_bytes(eml.as_bytes(), "invoice.eml").unwrap();
    let email = &result.emails[0];
    let invoice = &email.attachments[0];
    assert_eq!(invoice.filename, "invoice.pdf");
    assert_eq!(invoice.size, pdf.len());
    assert!(invoice.extracted_text.as_deref().unwrap().contains("Invoice total is due on Friday"));
    assert!(email.content.contains("--- Attachment: invoice.pdf ---"));
}
