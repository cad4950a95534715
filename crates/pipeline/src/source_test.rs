use super::*;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{Cursor, Write};
use tempfile::TempDir;

fn source(data: &'static [u8]) -> LineSource {
    LineSource::from_reader("test", Cursor::new(data)).unwrap()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn collect(source: LineSource) -> Vec<(u64, String)> {
    source
        .map(|line| {
            let line = line.unwrap();
            (line.number, line.text)
        })
        .collect()
}

#[test]
fn test_plain_lines() {
    let lines = collect(source(b"first\nsecond\nthird"));
    assert_eq!(
        lines,
        vec![
            (1, "first".to_string()),
            (2, "second".to_string()),
            (3, "third".to_string()),
        ]
    );
}

#[test]
fn test_crlf_terminators_stripped() {
    let lines = collect(source(b"one\r\ntwo\r\n"));
    assert_eq!(lines, vec![(1, "one".to_string()), (2, "two".to_string())]);
}

#[test]
fn test_blank_lines_skipped_but_numbered() {
    let metrics = Arc::new(PipelineMetrics::new());
    let source = source(b"a\n\n   \r\nb\n").with_metrics(Arc::clone(&metrics));

    let lines = collect(source);

    assert_eq!(lines, vec![(1, "a".to_string()), (4, "b".to_string())]);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.lines_read, 2);
    assert_eq!(snapshot.lines_skipped, 2);
}

#[test]
fn test_invalid_utf8_replaced() {
    let lines = collect(source(b"caf\xe9\n"));
    assert_eq!(lines, vec![(1, "caf\u{fffd}".to_string())]);
}

#[test]
fn test_empty_input() {
    let mut source = source(b"");
    assert!(source.next_line().unwrap().is_none());
    assert_eq!(source.position(), 0);
}

#[test]
fn test_gzip_detected() {
    let data = gzip(b"x\ny\n");
    let source = LineSource::from_reader("gz", Cursor::new(data)).unwrap();
    assert_eq!(collect(source), vec![(1, "x".to_string()), (2, "y".to_string())]);
}

#[test]
fn test_concatenated_gzip_members() {
    let mut data = gzip(b"first\n");
    data.extend(gzip(b"second\n"));

    let source = LineSource::from_reader("gz", Cursor::new(data)).unwrap();
    assert_eq!(
        collect(source),
        vec![(1, "first".to_string()), (2, "second".to_string())]
    );
}

#[test]
fn test_open_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sdk.log.gz");
    std::fs::write(&path, gzip(b"line\n")).unwrap();

    let source = LineSource::open(&path).unwrap();
    assert_eq!(source.name(), path.display().to_string());
    assert_eq!(collect(source), vec![(1, "line".to_string())]);
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = LineSource::open(dir.path().join("missing.log")).unwrap_err();
    assert!(matches!(err, PipelineError::Open { .. }));
}

#[tokio::test]
async fn test_feed_sends_all_lines() {
    let (tx, rx) = crossfire::mpmc::bounded_tx_blocking_rx_async::<RawLine>(1);
    let shutdown = Arc::new(Shutdown::new());

    let feeder = {
        let shutdown = Arc::clone(&shutdown);
        tokio::task::spawn_blocking(move || source(b"a\nb\n\nc\n").feed(tx, &shutdown))
    };

    let mut received = Vec::new();
    while let Ok(line) = rx.recv().await {
        received.push(line.number);
    }

    assert_eq!(feeder.await.unwrap(), 3);
    assert_eq!(received, vec![1, 2, 4]);
    assert!(shutdown.take_error().is_none());
}

#[tokio::test]
async fn test_feed_stops_when_receiver_dropped() {
    let (tx, rx) = crossfire::mpmc::bounded_tx_blocking_rx_async::<RawLine>(1);
    drop(rx);

    let shutdown = Shutdown::new();
    let sent = tokio::task::spawn_blocking(move || source(b"a\nb\n").feed(tx, &shutdown))
        .await
        .unwrap();
    assert_eq!(sent, 0);
}

#[test]
fn test_feed_stops_when_cancelled() {
    let (tx, _rx) = crossfire::mpmc::bounded_tx_blocking_rx_async::<RawLine>(1);
    let shutdown = Shutdown::new();
    shutdown.fail(PipelineError::Task("stop".into()));

    assert_eq!(source(b"a\nb\n").feed(tx, &shutdown), 0);
}
