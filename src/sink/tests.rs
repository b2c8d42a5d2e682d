//! Unit tests for sinks and fan-out

use super::*;
use crate::config::{DiscordConfig, LocalSinkConfig};
use chrono::{TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn outcome(number: u8) -> RoundOutcome {
    let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    RoundOutcome::new(number, ts, "Immersive Roulette", "20250101_120000").unwrap()
}

fn discord_sink(url: String) -> DiscordSink {
    DiscordSink::new(&DiscordConfig {
        webhook_url: url,
        notify_lifecycle: false,
    })
    .unwrap()
}

fn local_sink(endpoint: String) -> LocalSink {
    LocalSink::new(&LocalSinkConfig {
        endpoint,
        enabled: true,
    })
    .unwrap()
}

/// Minimal HTTP responder: answers a few requests with a fixed status line,
/// then goes away.
async fn stub_server(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for _ in 0..4 {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let mut buf = vec![0u8; 16384];
            let mut total = 0;
            loop {
                match stream.read(&mut buf[total..]).await {
                    Ok(0) => break,
                    Ok(n) => {
                        total += n;
                        if request_complete(&buf[..total]) || total == buf.len() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{addr}")
}

fn request_complete(data: &[u8]) -> bool {
    let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&data[..pos]);
    let content_length = headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    data.len() >= pos + 4 + content_length
}

/// An endpoint with nothing listening on it.
async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn webhook_delivery_requires_204() {
    let sink = discord_sink(stub_server("204 No Content").await);
    assert_eq!(sink.deliver(&outcome(7)).await, Delivery::Delivered);

    // 200 is not good enough for the webhook contract
    let sink = discord_sink(stub_server("200 OK").await);
    assert!(matches!(sink.deliver(&outcome(7)).await, Delivery::Failed(_)));
}

#[tokio::test]
async fn webhook_connection_refused_is_a_counted_failure() {
    let sink = discord_sink(refused_endpoint().await);
    assert!(matches!(sink.deliver(&outcome(7)).await, Delivery::Failed(_)));
}

#[tokio::test]
async fn local_sink_accepts_any_2xx_success_status() {
    let sink = local_sink(stub_server("200 OK").await);
    assert_eq!(sink.deliver(&outcome(12)).await, Delivery::Delivered);

    let sink = local_sink(stub_server("201 Created").await);
    assert_eq!(sink.deliver(&outcome(12)).await, Delivery::Delivered);
}

#[tokio::test]
async fn local_sink_connection_refused_is_soft_success() {
    let sink = local_sink(refused_endpoint().await);
    assert_eq!(sink.deliver(&outcome(12)).await, Delivery::Skipped);
}

#[tokio::test]
async fn local_sink_server_error_is_a_failure() {
    let sink = local_sink(stub_server("500 Internal Server Error").await);
    assert!(matches!(sink.deliver(&outcome(12)).await, Delivery::Failed(_)));
}

#[tokio::test]
async fn local_sink_health_probe() {
    let sink = local_sink(stub_server("200 OK").await);
    assert!(sink.health().await);

    let sink = local_sink(refused_endpoint().await);
    assert!(!sink.health().await);
}

#[tokio::test]
async fn day_store_appends_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let store = DayFileStore::new(dir.path());

    assert_eq!(store.append(&outcome(15)).await.unwrap(), 1);
    assert_eq!(store.append(&outcome(22)).await.unwrap(), 2);

    let date = outcome(0).timestamp.date_naive();
    let records = store.load_day(date).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].number, 15);
    assert_eq!(records[1].number, 22);
    assert!(records[1].is_even);
    assert_eq!(records[1].dozen, 2);

    assert!(store
        .day_file(date)
        .to_string_lossy()
        .ends_with("results_20250101.json"));
}

#[tokio::test]
async fn day_store_reads_absent_day_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = DayFileStore::new(dir.path());
    let date = outcome(0).timestamp.date_naive();
    assert!(store.load_day(date).await.unwrap().is_empty());
}

#[tokio::test]
async fn sink_failures_are_isolated_from_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let mut distributor = Distributor::new(
        // webhook endpoint is down
        Some(discord_sink(refused_endpoint().await)),
        Some(local_sink(stub_server("204 No Content").await)),
        Some(DayFileStore::new(dir.path())),
    );

    let reports = distributor.distribute(&outcome(29)).await;
    assert_eq!(reports.len(), 3);

    let status_of = |kind: SinkKind| {
        reports
            .iter()
            .find(|r| r.sink == kind)
            .map(|r| r.status.clone())
            .unwrap()
    };
    assert!(matches!(status_of(SinkKind::Webhook), Delivery::Failed(_)));
    assert_eq!(status_of(SinkKind::Local), Delivery::Delivered);
    assert_eq!(status_of(SinkKind::Store), Delivery::Delivered);

    let counters = distributor.counters();
    assert_eq!(counters.webhook_sent, 0);
    assert_eq!(counters.local_sent, 1);
    assert_eq!(counters.persisted, 1);
    assert_eq!(counters.failures, 1);
}

#[tokio::test]
async fn skipped_local_sink_does_not_count_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut distributor = Distributor::new(
        None,
        Some(local_sink(refused_endpoint().await)),
        Some(DayFileStore::new(dir.path())),
    );

    let reports = distributor.distribute(&outcome(3)).await;
    assert_eq!(reports.len(), 2);
    assert_eq!(distributor.counters().failures, 0);
    assert_eq!(distributor.counters().persisted, 1);
}

#[tokio::test]
async fn distributor_with_no_sinks_is_a_no_op() {
    let mut distributor = Distributor::new(None, None, None);
    assert!(distributor.distribute(&outcome(0)).await.is_empty());
}

#[tokio::test]
async fn batch_send_reports_rejection() {
    let sink = local_sink(stub_server("204 No Content").await);
    let records = vec![outcome(1).to_record(), outcome(2).to_record()];
    assert_eq!(sink.send_batch(records).await.unwrap(), Delivery::Delivered);

    let sink = local_sink(stub_server("500 Internal Server Error").await);
    let err = sink.send_batch(vec![outcome(1).to_record()]).await.unwrap_err();
    assert!(matches!(
        err,
        crate::error::CollectorError::SinkRejected { sink: "local", status: 500 }
    ));
}
