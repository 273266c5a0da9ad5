//! Scan and display sessions driven over channels.

mod common;

use std::time::Duration;

use futures_util::StreamExt;
use qrweave::{
    DisplayTiming, EncodeOptions, Qrweave, ScanEvent, Scheme, source,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn display_session_rotates_frames() {
    common::init_tracing();
    let opts = EncodeOptions { max_fragment_size: Some(5), ..Default::default() };
    let sequence = Qrweave::encode("hello world", &opts, &common::codecs()).unwrap();
    let session = Qrweave::display(sequence, DisplayTiming::default());

    let mut frames = session.frames();
    let mut seen = Vec::new();
    for _ in 0..4 {
        let frame = frames.next().await.expect("frame");
        seen.push((frame.text.clone(), frame.label.clone()));
    }

    assert_eq!(seen[0], ("p1of3 hello".to_string(), "1/3".to_string()));
    assert_eq!(seen[1], ("p2of3  worl".to_string(), "2/3".to_string()));
    assert_eq!(seen[2], ("p3of3 d".to_string(), "3/3".to_string()));
    // Wraps around after a full pass.
    assert_eq!(seen[3], seen[0]);
}

#[tokio::test(start_paused = true)]
async fn single_fragment_displays_once_and_holds() {
    common::init_tracing();
    let opts = EncodeOptions { max_fragment_size: Some(100), ..Default::default() };
    let sequence = Qrweave::encode("short", &opts, &common::codecs()).unwrap();
    let session = Qrweave::display(sequence, DisplayTiming::default());

    let frame = session.frames().next().await.expect("frame");
    assert_eq!(frame.text, "short");
    assert_eq!(frame.label, "1/1");
    session.stop();
}

#[tokio::test]
async fn scan_session_completes_from_channel() {
    common::init_tracing();
    let (sender, fragments) = source::channel(16);
    let mut session = Qrweave::scan(fragments, common::codecs());

    for text in ["p3of3 d", "p1of3 hello", "p2of3  worl"] {
        assert!(sender.send(text).await);
    }

    let payload = timeout(WAIT, session.wait()).await.expect("timely").expect("complete");
    assert_eq!(payload.as_text(), Some("hello world"));
    assert!(matches!(session.latest(), Some(ScanEvent::Completed(_))));
}

#[tokio::test]
async fn scan_failure_discards_and_keeps_scanning() {
    common::init_tracing();
    let (sender, fragments) = source::channel(16);
    let mut session = Qrweave::scan(fragments, common::codecs());
    let mut events = session.events();

    sender.send("p1of2 aa").await;
    sender.send("p1of2 zz").await;
    timeout(WAIT, async {
        loop {
            if let Some(ScanEvent::Failed(_)) = events.next().await {
                break;
            }
        }
    })
    .await
    .expect("failure surfaced");

    // A fresh instance assembles after the failure.
    sender.send("p1of2 xx").await;
    sender.send("p2of2 yy").await;
    let payload = timeout(WAIT, session.wait()).await.expect("timely").expect("complete");
    assert_eq!(payload.as_text(), Some("xxyy"));
}

#[tokio::test]
async fn exhausted_source_ends_without_completion() {
    common::init_tracing();
    let (sender, fragments) = source::channel(16);
    let mut session = Qrweave::scan(fragments, common::codecs());

    sender.send("p1of2 partial").await;
    drop(sender);

    assert!(timeout(WAIT, session.wait()).await.expect("timely").is_none());
}

#[tokio::test]
async fn stopping_display_leaves_scan_untouched() {
    common::init_tracing();
    let opts = EncodeOptions {
        scheme: Scheme::Bbqr,
        max_fragment_size: Some(10),
        ..Default::default()
    };
    let payload = "payload shown while another device scans";
    let mut sequence = Qrweave::encode(payload, &opts, &common::codecs()).unwrap();
    let parts: Vec<String> = (0..sequence.total()).map(|_| sequence.next().text).collect();

    let display = Qrweave::display(
        Qrweave::encode(payload, &opts, &common::codecs()).unwrap(),
        DisplayTiming::default(),
    );
    let (sender, fragments) = source::channel(16);
    let mut scan = Qrweave::scan(fragments, common::codecs());

    display.stop();

    for part in &parts {
        sender.send(part.clone()).await;
    }
    let result = timeout(WAIT, scan.wait()).await.expect("timely").expect("complete");
    assert_eq!(result.as_text(), Some(payload));
}
