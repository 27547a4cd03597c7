//! Concurrency tests for the page pool and shared extractors.
//!
//! Page order must not depend on worker count, and one extractor must be
//! usable from many threads at once.

#![cfg(feature = "pdf")]

use postfach::core::config::ExtractorConfig;
use std::sync::Arc;
use std::thread;

mod helpers;
use helpers::{init_tracing, offline_extractor, pdf_with_pages};

fn numbered_pages(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("Paragraph number {} of the export", n)).collect()
}

#[test]
fn test_output_independent_of_worker_count() {
    init_tracing();
    let pages = numbered_pages(24);
    let refs: Vec<&str> = pages.iter().map(String::as_str).collect();
    let bytes = pdf_with_pages(&refs);

    let baseline = offline_extractor(ExtractorConfig {
        max_workers: 1,
        ..Default::default()
    })
    .extract_bytes(&bytes, "export.pdf")
    .unwrap();

    for workers in [2, 3, 8, 64] {
        let extractor = offline_extractor(ExtractorConfig::default());
        extractor.set_max_workers(workers);
        let result = extractor.extract_bytes(&bytes, "export.pdf").unwrap();
        assert_eq!(result.emails, baseline.emails, "workers = {}", workers);
    }

    let lines: Vec<&str> = baseline.emails[0].content.lines().collect();
    assert_eq!(lines, refs);
}

#[test]
fn test_shared_extractor_across_threads() {
    init_tracing();
    let extractor = Arc::new(offline_extractor(ExtractorConfig::default()));
    let pages = numbered_pages(10);
    let refs: Vec<&str> = pages.iter().map(String::as_str).collect();
    let bytes = Arc::new(pdf_with_pages(&refs));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let extractor = Arc::clone(&extractor);
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || {
                if i % 2 == 0 {
                    extractor.set_max_workers(i + 1);
                }
                extractor.extract_bytes(&bytes, "shared.pdf").unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for result in &results[1..] {
        assert_eq!(result.emails, results[0].emails);
    }
    assert!(extractor.max_workers() >= 1 && extractor.max_workers() <= 8);
}
