//! End-to-end tests of the device link over real loopback sockets.
//!
//! A `TcpListener` on 127.0.0.1 plays the device.  Delays are shortened so
//! reconnect paths run in milliseconds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use twin_client::application::operator::{DeviceLink, OperatorSession};
use twin_client::infrastructure::network::{
    Dispatcher, LinkConfig, LinkManager, LinkState, TcpConnector,
};
use twin_core::{FramingMode, MotorState};

const STEP: Duration = Duration::from_secs(5);

fn fast_config(port: u16) -> LinkConfig {
    LinkConfig::new("127.0.0.1", port)
        .with_reconnect_delay(Duration::from_millis(50))
        .with_read_timeout(Duration::from_millis(50))
}

async fn device() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn accept(listener: &TcpListener) -> TcpStream {
    timeout(STEP, listener.accept())
        .await
        .expect("link should connect")
        .unwrap()
        .0
}

async fn read_line(stream: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    timeout(STEP, stream.read_line(&mut line))
        .await
        .expect("device should receive a line")
        .unwrap();
    line
}

#[tokio::test]
async fn test_commands_arrive_newline_terminated() {
    // Arrange
    let (listener, port) = device().await;
    let link = LinkManager::new(fast_config(port), TcpConnector);
    let (_, accepted) = tokio::join!(link.connect(), accept(&listener));
    let mut device = BufReader::new(accepted);

    // Act
    link.send("start").await.unwrap();
    link.send("velocidad:3").await.unwrap();

    // Assert
    assert_eq!(read_line(&mut device).await, "start\n");
    assert_eq!(read_line(&mut device).await, "velocidad:3\n");
}

#[tokio::test]
async fn test_connect_keeps_retrying_until_device_listens() {
    // Arrange: reserve a port, then close it so the first attempts are refused.
    let (listener, port) = device().await;
    drop(listener);
    let link = Arc::new(LinkManager::new(fast_config(port), TcpConnector));
    let connecting = tokio::spawn({
        let link = Arc::clone(&link);
        async move { link.connect().await }
    });

    // Act: the device comes up a few backoff periods later.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!link.is_connected());
    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let _device = accept(&listener).await;
    timeout(STEP, connecting).await.unwrap().unwrap();

    // Assert
    assert_eq!(link.status().state, LinkState::Connected);
    assert_eq!(link.status().generation, 1);
}

#[tokio::test]
async fn test_device_hangup_is_followed_by_reconnect() {
    // Arrange
    let (listener, port) = device().await;
    let link = Arc::new(LinkManager::new(fast_config(port), TcpConnector));
    let (_, first) = tokio::join!(link.connect(), accept(&listener));

    // Act: the device closes; the next read notices and reconnects.
    drop(first);
    let (received, second) = tokio::join!(link.receive(), accept(&listener));

    // Assert
    assert_eq!(received, None);
    assert!(link.is_connected());
    assert_eq!(link.status().generation, 2);

    let mut second = BufReader::new(second);
    link.send("stop").await.unwrap();
    assert_eq!(read_line(&mut second).await, "stop\n");
}

#[tokio::test]
async fn test_session_follows_device_through_dispatcher() {
    // Arrange
    let (listener, port) = device().await;
    let link = Arc::new(LinkManager::new(fast_config(port), TcpConnector));
    let (_, mut device) = tokio::join!(link.connect(), accept(&listener));
    let running = Arc::new(AtomicBool::new(true));
    let (mut lines, receive_task) = Dispatcher::new(Arc::clone(&link)).start(Arc::clone(&running));
    let mut session = OperatorSession::new(Arc::clone(&link) as Arc<dyn DeviceLink>);

    // Act
    device
        .write_all(b"OK:START\nOK:VEL:5\nSENSOR:{\"temperatura\":22.0,\"humedad\":55.5}\n")
        .await
        .unwrap();
    for _ in 0..3 {
        let line = timeout(STEP, lines.recv()).await.unwrap().unwrap();
        session.handle_line(&line);
    }
    session.poll_link();

    // Assert
    let state = session.state();
    assert_eq!(state.motor, MotorState::Running);
    assert_eq!(state.step_delay_ms, 5);
    assert_eq!(state.temperature_c, Some(22.0));
    assert_eq!(state.humidity_pct, Some(55.5));
    assert!(state.link_up);

    running.store(false, Ordering::Relaxed);
    timeout(STEP, receive_task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_per_read_framing_splits_a_line_broken_across_reads() {
    // Arrange
    let (listener, port) = device().await;
    let link = Arc::new(LinkManager::new(
        fast_config(port).with_framing(FramingMode::PerRead),
        TcpConnector,
    ));
    let (_, mut device) = tokio::join!(link.connect(), accept(&listener));
    device.set_nodelay(true).unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let (mut lines, receive_task) = Dispatcher::new(Arc::clone(&link)).start(Arc::clone(&running));

    // Act: half a line, a pause long enough for a read, then the rest.
    device.write_all(b"OK:ST").await.unwrap();
    let first = timeout(STEP, lines.recv()).await.unwrap().unwrap();
    device.write_all(b"ART\n").await.unwrap();
    let second = timeout(STEP, lines.recv()).await.unwrap().unwrap();

    // Assert: each read is framed on its own; the fragments are not rejoined.
    assert_eq!(first, "OK:ST");
    assert_eq!(second, "ART");

    running.store(false, Ordering::Relaxed);
    receive_task.abort();
}

#[tokio::test]
async fn test_buffered_framing_rejoins_a_line_broken_across_reads() {
    let (listener, port) = device().await;
    let link = Arc::new(LinkManager::new(
        fast_config(port).with_framing(FramingMode::Buffered),
        TcpConnector,
    ));
    let (_, mut device) = tokio::join!(link.connect(), accept(&listener));
    device.set_nodelay(true).unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let (mut lines, receive_task) = Dispatcher::new(Arc::clone(&link)).start(Arc::clone(&running));

    device.write_all(b"OK:ST").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    device.write_all(b"ART\n").await.unwrap();

    assert_eq!(timeout(STEP, lines.recv()).await.unwrap().as_deref(), Some("OK:START"));

    running.store(false, Ordering::Relaxed);
    receive_task.abort();
}
