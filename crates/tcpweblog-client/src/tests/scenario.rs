//! End-to-end runs of the forwarder.

use super::harness::{frame, store_lines, tags, MockTransport};
use crate::forwarder::{Delivery, Forwarder};
use overflow_store::OverflowStore;
use std::time::Duration;
use tempfile::tempdir;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use weblog_transport::TcpTransport;

#[tokio::test]
async fn outage_then_recovery_with_mock_transport() {
    let dir = tempdir().unwrap();
    let store = OverflowStore::new(dir.path().join("tcpweblog_cache.log"));
    let mut forwarder = Forwarder::new(tags(), MockTransport::offline(), store);

    assert_eq!(
        forwarder.forward(b"GET / HTTP/1.1 200").await,
        Delivery::Cached
    );
    assert_eq!(
        std::fs::read(forwarder.store().path()).unwrap(),
        b"@@access.log\t1\t10.0.2.15\txhost\tGET / HTTP/1.1 200\n"
    );

    forwarder.transport_mut().set_reachable(true);
    assert_eq!(
        forwarder.forward(b"GET /next HTTP/1.1 200\n").await,
        Delivery::Live
    );

    assert_eq!(
        forwarder.transport().sent(),
        &[
            frame("GET /next HTTP/1.1 200\n").as_bytes().to_vec(),
            b"@@access.log\t1\t10.0.2.15\txhost\tGET / HTTP/1.1 200\n".to_vec(),
        ]
    );
    assert!(!forwarder.store().exists().await);
    assert_eq!(forwarder.stats().replayed, 1);
    assert_eq!(forwarder.transport().connects(), 1);
}

#[tokio::test]
async fn run_caches_everything_when_collector_never_appears() {
    let dir = tempdir().unwrap();
    let store = OverflowStore::new(dir.path().join("cache.log"));
    let mut forwarder = Forwarder::new(tags(), MockTransport::offline(), store);

    let stats = forwarder.run(&b"one\ntwo\nthree\n"[..]).await;

    assert_eq!(stats.cached, 3);
    assert_eq!(
        store_lines(forwarder.store().path()),
        vec![
            frame("one\n").as_bytes().to_vec(),
            frame("two\n").as_bytes().to_vec(),
            frame("three\n").as_bytes().to_vec(),
        ]
    );
}

#[tokio::test]
async fn existing_backlog_is_replayed_after_first_live_record() {
    let dir = tempdir().unwrap();
    let store = OverflowStore::new(dir.path().join("cache.log"));
    // Left behind by an earlier process.
    store.append(frame("old\n").as_bytes()).await.unwrap();

    let mut forwarder = Forwarder::new(tags(), MockTransport::online(), store);
    let stats = forwarder.run(&b"new\n"[..]).await;

    assert_eq!(stats.live, 1);
    assert_eq!(stats.replayed, 1);
    assert_eq!(
        forwarder.transport().sent(),
        &[
            frame("new\n").as_bytes().to_vec(),
            frame("old\n").as_bytes().to_vec(),
        ]
    );
    assert!(!forwarder.store().exists().await);
}

#[tokio::test]
async fn tcp_collector_receives_live_then_cached_records() {
    let dir = tempdir().unwrap();

    // Reserve a port, then close it so the first connect is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = OverflowStore::new(dir.path().join("cache.log"));
    let mut forwarder = Forwarder::new(tags(), TcpTransport::new(addr), store);

    assert_eq!(forwarder.forward(b"during outage\n").await, Delivery::Cached);
    assert!(forwarder.store().exists().await);

    let listener = TcpListener::bind(addr).await.unwrap();
    let collector = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        received
    });

    assert_eq!(forwarder.forward(b"after recovery\n").await, Delivery::Live);
    forwarder.shutdown().await;

    let received = tokio::time::timeout(Duration::from_secs(5), collector)
        .await
        .unwrap()
        .unwrap();

    let mut expected = frame("after recovery\n").as_bytes().to_vec();
    expected.extend_from_slice(frame("during outage\n").as_bytes());
    assert_eq!(received, expected);
    assert!(!forwarder.store().exists().await);

    let stats = forwarder.stats();
    assert_eq!((stats.live, stats.cached, stats.replayed), (1, 1, 1));
}
