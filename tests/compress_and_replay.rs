//! End-to-end tests compressing a raw feed to disk and replaying it back.

use ob_history::{CompressorConfig, TraverserConfig};
use ob_history::{Compressor, Traverser, TraverserError};
use std::io::{BufReader, Write};

/// Installs a `tracing` subscriber writing to the test harness's captured
/// output, so `cargo test -- --nocapture` shows the engine's trace/debug
/// logging alongside assertions.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

const RAW_FEED: &[&str] = &[
    r#"{"type":"snapshot","ts":1000,"data":{"seq":1,"b":[["100","10"],["99","5"]],"a":[["101","8"],["102","4"]]}}"#,
    r#"{"type":"delta","ts":2000,"data":{"seq":2,"b":[["100","20"]]}}"#,
    r#"{"type":"delta","ts":3000,"data":{"seq":3,"a":[["101","0"],["103","6"]]}}"#,
    r#"{"type":"delta","ts":4000,"data":{"seq":4,"b":[["98","3"]]}}"#,
];

fn compress_fixture() -> tempfile::NamedTempFile {
    let mut compressed = tempfile::NamedTempFile::new().unwrap();
    let mut compressor = Compressor::new(CompressorConfig::default());
    let input = BufReader::new(RAW_FEED.join("\n").as_bytes());
    compressor
        .compress_transcript(input, &mut compressed)
        .unwrap();
    compressed.flush().unwrap();
    compressed
}

#[test]
fn compressed_transcript_starts_with_a_full_snapshot() {
    init_tracing();
    let compressed = compress_fixture();
    let contents = std::fs::read_to_string(compressed.path()).unwrap();
    let first_line = contents.lines().next().unwrap();
    let record: ob_history::CompressedRecord = serde_json::from_str(first_line).unwrap();
    assert_eq!(record.t, 1000);
    assert!(record.b.is_some());
    assert!(record.a.is_some());
}

#[test]
fn traverser_replays_a_compressed_transcript_end_to_end() {
    init_tracing();
    let compressed = compress_fixture();
    let mut traverser =
        Traverser::new("BTCUSD", compressed.path(), TraverserConfig::default()).unwrap();

    assert_eq!(traverser.get().timestamp, 1000);
    assert_eq!(traverser.best_bid().unwrap().to_string(), "100");
    assert_eq!(traverser.best_ask().unwrap().to_string(), "101");

    traverser.step().unwrap();
    assert_eq!(traverser.get().timestamp, 2000);
    assert_eq!(traverser.best_bid().unwrap().to_string(), "100");

    traverser.step().unwrap();
    assert_eq!(traverser.get().timestamp, 3000);
    // 101 was deleted and 103 entered the top of book on the ask side.
    assert_eq!(traverser.best_ask().unwrap().to_string(), "102");

    traverser.reset().unwrap();
    assert_eq!(traverser.get().timestamp, 1000);
}

#[test]
fn skip_and_step_reach_the_same_state_as_a_linear_scan() {
    init_tracing();
    let compressed = compress_fixture();
    let mut stepper =
        Traverser::new("BTCUSD", compressed.path(), TraverserConfig::default()).unwrap();
    stepper.step().unwrap();
    stepper.step().unwrap();
    stepper.step().unwrap();

    let mut skipper =
        Traverser::new("BTCUSD", compressed.path(), TraverserConfig::default()).unwrap();
    skipper.skip(3.0).unwrap();

    assert_eq!(stepper.get().timestamp, skipper.get().timestamp);
    assert_eq!(stepper.get().sequence, skipper.get().sequence);
    assert_eq!(stepper.best_bid(), skipper.best_bid());
    assert_eq!(stepper.best_ask(), skipper.best_ask());
}

#[test]
fn move_by_reports_the_observed_price_range() {
    init_tracing();
    let compressed = compress_fixture();
    let mut traverser =
        Traverser::new("BTCUSD", compressed.path(), TraverserConfig::default()).unwrap();

    let range = traverser.move_by(3.0).unwrap();
    assert_eq!(range.start_time, 1000);
    assert_eq!(range.end_time, 4000);
    assert!(range.highest_bid.is_some());
    assert!(range.lowest_ask.is_some());
}

#[test]
fn move_by_rejects_non_positive_intervals() {
    init_tracing();
    let compressed = compress_fixture();
    let mut traverser =
        Traverser::new("BTCUSD", compressed.path(), TraverserConfig::default()).unwrap();

    assert!(matches!(
        traverser.move_by(0.0),
        Err(TraverserError::InvalidArgument(_))
    ));
    assert!(matches!(
        traverser.move_by(-1.0),
        Err(TraverserError::InvalidArgument(_))
    ));
}

#[test]
fn at_truncates_the_offset_to_whole_seconds() {
    init_tracing();
    let compressed = compress_fixture();
    let mut traverser =
        Traverser::new("BTCUSD", compressed.path(), TraverserConfig::default()).unwrap();

    // 1000 + 1500ms truncates to a 1-second offset, landing on t=2000, not
    // exactly at the 2500ms mark.
    traverser.at(2500).unwrap();
    assert_eq!(traverser.get().timestamp, 2000);
}
