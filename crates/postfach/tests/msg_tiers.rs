//! Outlook `.msg` tier selection tests.
//!
//! Compound files are assembled with `cfb` so each tier can be reached on purpose.

use postfach::core::config::ExtractorConfig;
use postfach::extraction::msg::properties::{PR_BODY, PR_DISPLAY_TO, PR_SENDER_EMAIL, PR_SENDER_NAME, PR_SUBJECT};
use postfach::{DocumentFormat, NOT_FOUND, ParsingMethod};

mod helpers;
use helpers::{msg_with_properties, offline_extractor};

#[test]
fn test_plain_buffer_uses_text_fallback_only() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let data = b"Subject: Status update\nFrom: alice@example.com\nTo: team@example.com\n\
The deployment finished without problems last night.\n";

    let result = extractor.extract_bytes(data, "status.msg").unwrap();
    assert_eq!(result.format, DocumentFormat::Msg);
    assert_eq!(result.diagnostics.parsing_method, Some(ParsingMethod::FallbackTextExtraction));
    assert_eq!(result.diagnostics.tiers_attempted, vec!["fallback_text_extraction"]);

    let email = &result.emails[0];
    assert_eq!(email.subject, "Status update");
    assert_eq!(email.sender, "alice@example.com");
    assert_eq!(email.recipient, "team@example.com");
    assert!(email.content.contains("deployment finished"));
}

#[test]
fn test_property_streams_are_mapped() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let data = msg_with_properties(&[
        (PR_SUBJECT, "Invoice 42"),
        (PR_SENDER_NAME, "Billing"),
        (PR_SENDER_EMAIL, "billing@example.com"),
        (PR_DISPLAY_TO, "Finance Team"),
        (PR_BODY, "Please find the invoice attached."),
    ]);

    let result = extractor.extract_bytes(&data, "invoice.msg").unwrap();
    let email = &result.emails[0];
    assert_eq!(email.subject, "Invoice 42");
    assert_eq!(email.recipient, "Finance Team");
    assert!(email.content.contains("Please find the invoice attached."));
    assert!(
        !result
            .diagnostics
            .tiers_attempted
            .contains(&"fallback_text_extraction".to_string())
    );

    #[cfg(not(feature = "msg-enhanced"))]
    {
        assert_eq!(
            result.diagnostics.parsing_method,
            Some(ParsingMethod::StructuredPropertyMapping)
        );
        assert_eq!(email.sender, "Billing <billing@example.com>");
        assert_eq!(email.date, NOT_FOUND);
    }
}

#[test]
fn test_empty_compound_file_reaches_text_tier() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let data = msg_with_properties(&[]);

    let result = extractor.extract_bytes_record(&data, "empty.msg");
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.diagnostics.parsing_method, Some(ParsingMethod::FallbackTextExtraction));
    assert_eq!(
        result.diagnostics.tiers_attempted,
        vec!["structured_property_mapping", "fallback_text_extraction"]
    );
    assert_eq!(result.emails.len(), 1);
}

#[test]
fn test_unreadable_buffer_is_error_record() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let result = extractor.extract_bytes_record(b"", "blank.msg");
    assert!(!result.success);
    assert_eq!(result.format, DocumentFormat::Msg);
    let error = result.error.unwrap();
    assert_eq!(error.kind, "msg_parse_failure");
    assert!(error.message.contains("Could not extract readable text from MSG file"));
}

#[test]
fn test_attachment_names_detected_in_text() {
    let extractor = offline_extractor(ExtractorConfig::default());
    let data = b"Subject: Files\nFrom: carol@example.com\n\
Attached you will find report_q3.pdf and notes.docx for the meeting.\n";

    let result = extractor.extract_bytes(data, "files.msg").unwrap();
    let names: Vec<&str> = result.emails[0]
        .attachments
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    assert!(names.contains(&"report_q3.pdf"));
    assert!(names.contains(&"notes.docx"));
    assert_eq!(result.diagnostics.attachments_count, result.emails[0].attachments.len());
}
