use super::PubSubClient;
use crate::broker::{Broker, BrokerStats};
use crate::config::Settings;
use crate::transport::serve;
use crate::utils::PubSubError;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};

async fn start_server(settings: Settings) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(serve(listener, Arc::new(Broker::new()), settings));
    format!("ws://{addr}")
}

async fn connect(url: &str) -> PubSubClient {
    PubSubClient::connect(url).await.expect("connect")
}

#[tokio::test]
async fn test_publish_subscribe() {
    let url = start_server(Settings::default()).await;
    let mut api = connect(&url).await;

    let pid = api.register_publisher().await.unwrap();
    assert_eq!(pid, "P1");
    api.create_topic(&pid, "sports").await.unwrap();

    let sid = api.register_subscriber().await.unwrap();
    assert_eq!(sid, "S1");
    let reply = api.subscribe(&sid, "sports").await.unwrap();
    assert_eq!(reply, "Subscriber S1 subscribed to topic sports");

    let message = "The match is today!!!";
    api.send_message(&pid, "sports", message).await.unwrap();

    let pulled = api.pull_messages(&sid, "sports").await.unwrap();
    assert_eq!(pulled, vec![message]);
    assert!(api.pull_messages(&sid, "sports").await.unwrap().is_empty());

    api.close().await.unwrap();
}

#[tokio::test]
async fn test_multiple_publishers_subscribers() {
    let url = start_server(Settings::default()).await;
    let topics = ["sports", "news", "weather", "tech"];
    let mut api = connect(&url).await;

    let mut publishers = Vec::new();
    for i in 0..6 {
        let pid = api.register_publisher().await.unwrap();
        let topic = topics[i % topics.len()];
        api.create_topic(&pid, topic).await.unwrap();
        publishers.push((pid, topic));
    }

    let mut subscribers = Vec::new();
    for i in 0..5 {
        let sid = api.register_subscriber().await.unwrap();
        let topic = topics[i % topics.len()];
        api.subscribe(&sid, topic).await.unwrap();
        subscribers.push((sid, topic));
    }

    for (pid, topic) in &publishers {
        let message = format!("Message from {pid} on {topic}");
        api.send_message(pid, topic, &message).await.unwrap();
    }

    for (sid, topic) in &subscribers {
        let pulled = api.pull_messages(sid, topic).await.unwrap();
        let expected: Vec<String> = publishers
            .iter()
            .filter(|(_, t)| t == topic)
            .map(|(pid, t)| format!("Message from {pid} on {t}"))
            .collect();
        assert_eq!(pulled, expected, "subscriber {sid} on {topic}");
    }
}

#[tokio::test]
async fn test_ping_pong_between_clients() {
    let url = start_server(Settings::default()).await;
    let mut client1 = connect(&url).await;
    let mut client2 = connect(&url).await;

    let id1 = client1.register_publisher().await.unwrap();
    let id2 = client2.register_publisher().await.unwrap();
    assert_ne!(id1, id2);

    client1.create_topic(&id1, "ping").await.unwrap();
    client2.create_topic(&id2, "pong").await.unwrap();
    client1.subscribe(&id1, "pong").await.unwrap();
    client2.subscribe(&id2, "ping").await.unwrap();

    client1
        .send_message(&id1, "ping", "Ping from Client 1!")
        .await
        .unwrap();
    let pulled2 = client2.pull_messages(&id2, "ping").await.unwrap();
    assert_eq!(pulled2, vec!["Ping from Client 1!"]);

    client2
        .send_message(&id2, "pong", "Pong from Client 2!")
        .await
        .unwrap();
    let pulled1 = client1.pull_messages(&id1, "pong").await.unwrap();
    assert_eq!(pulled1, vec!["Pong from Client 2!"]);
}

#[tokio::test]
async fn test_queue_survives_reconnect() {
    let url = start_server(Settings::default()).await;

    let mut first = connect(&url).await;
    let sid = first.register_subscriber().await.unwrap();
    first.create_topic("P0", "news").await.unwrap();
    first.subscribe(&sid, "news").await.unwrap();
    first.send_message("P0", "news", "while away").await.unwrap();
    first.close().await.unwrap();

    let mut second = connect(&url).await;
    assert_eq!(
        second.pull_messages(&sid, "news").await.unwrap(),
        vec!["while away"]
    );
}

#[tokio::test]
async fn test_delete_topic_and_stats() {
    let url = start_server(Settings::default()).await;
    let mut api = connect(&url).await;

    api.create_topic("P1", "news").await.unwrap();
    api.subscribe("S1", "news").await.unwrap();
    api.send_message("P1", "news", "x").await.unwrap();
    assert_eq!(
        api.stats().await.unwrap(),
        BrokerStats {
            topics: 1,
            subscriptions: 1,
            pending_messages: 1,
        }
    );

    api.delete_topic("P1", "news").await.unwrap();
    assert_eq!(api.stats().await.unwrap(), BrokerStats::default());
    assert!(api.pull_messages("S1", "news").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_limit() {
    let mut settings = Settings::default();
    settings.broker.max_connections = 1;
    let url = start_server(settings).await;

    let mut first = connect(&url).await;
    first.register_publisher().await.unwrap();

    let mut second = connect(&url).await;
    let err = second.register_publisher().await.unwrap_err();
    assert!(
        matches!(
            err,
            PubSubError::Server(_) | PubSubError::ConnectionClosed | PubSubError::WebSocket(_)
        ),
        "unexpected error: {err}"
    );

    // The first connection is unaffected.
    assert_eq!(first.register_publisher().await.unwrap(), "P2");
}

#[tokio::test]
async fn test_stalled_handshake_holds_slot_until_timeout() {
    let mut settings = Settings::default();
    settings.broker.max_connections = 1;
    settings.broker.handshake_timeout_ms = 500;
    let url = start_server(settings).await;
    let addr = url.trim_start_matches("ws://").to_string();

    // Raw TCP peer that never sends a handshake.
    let mut stalled = TcpStream::connect(&addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut rejected = connect(&url).await;
    assert!(rejected.register_publisher().await.is_err());

    // The server drops the stalled peer once the handshake times out.
    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(3), stalled.read(&mut buf))
        .await
        .expect("stalled socket still open after handshake timeout");
    assert!(matches!(read, Ok(0) | Err(_)), "unexpected read: {read:?}");

    // Its slot is free again.
    let mut admitted = connect(&url).await;
    assert_eq!(admitted.register_publisher().await.unwrap(), "P1");
}
