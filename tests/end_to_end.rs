//! End-to-end tests: HTTP config document, local websocket server, real engine.

use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use listener_service::{
    LifecycleEvent, Observer, SessionOrchestrator, SessionPhase, WsEngine, WsEngineOptions,
};

const WAIT: Duration = Duration::from_secs(10);

// ============================================================================
// Helpers
// ============================================================================

struct Recorder(mpsc::UnboundedSender<LifecycleEvent>);

impl Observer for Recorder {
    fn on_event(&self, event: LifecycleEvent) {
        let _ = self.0.send(event);
    }
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<LifecycleEvent>) -> LifecycleEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("event within timeout")
        .expect("observer channel open")
}

/// Accepts one client, sends the given text frames, then closes.
async fn feed(frames: &[&str]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let frames: Vec<String> = frames.iter().map(|f| (*f).to_string()).collect();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("upgrade");
        for frame in frames {
            ws.send(Message::Text(frame.into())).await.expect("send");
        }
        let _ = ws.close(None).await;
    });

    format!("ws://127.0.0.1:{port}/feed")
}

async fn config_server(body: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn orchestrator(config_url: String, observer: &Arc<Recorder>) -> SessionOrchestrator {
    let options = WsEngineOptions::new().with_reconnect_delay(Duration::from_secs(30));

    SessionOrchestrator::builder()
        .config_url(config_url)
        .engine(WsEngine::with_options(options))
        .observer(observer)
        .build()
        .expect("build")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_streams_messages_until_stopped() {
    let ws_url = feed(&["a", "b"]).await;
    let server = config_server(format!(r#"{{"WS_FEEDER_SERVICE":"{ws_url}"}}"#)).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let observer = Arc::new(Recorder(tx));
    let orchestrator = orchestrator(format!("{}/config.json", server.uri()), &observer);

    assert!(orchestrator.start().is_started());

    assert_eq!(next_event(&mut rx).await, LifecycleEvent::Started(None));
    assert_eq!(
        next_event(&mut rx).await,
        LifecycleEvent::connecting("Connecting (attempt 1)...")
    );
    assert_eq!(next_event(&mut rx).await, LifecycleEvent::connected(ws_url.as_str()));
    assert_eq!(next_event(&mut rx).await, LifecycleEvent::message("a"));
    assert_eq!(next_event(&mut rx).await, LifecycleEvent::message("b"));
    assert_eq!(
        next_event(&mut rx).await,
        LifecycleEvent::disconnected("Server closed connection")
    );
    assert_eq!(orchestrator.phase(), SessionPhase::Active);

    orchestrator.stop().await;

    assert_eq!(next_event(&mut rx).await, LifecycleEvent::stopped("Service stopped"));
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_endpoint_reports_error() {
    let server = config_server(r#"{"somethingElse":"wss://x/y"}"#.to_string()).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let observer = Arc::new(Recorder(tx));
    let orchestrator = orchestrator(format!("{}/config.json", server.uri()), &observer);

    orchestrator.start();

    assert_eq!(next_event(&mut rx).await, LifecycleEvent::Started(None));
    match next_event(&mut rx).await {
        LifecycleEvent::Error(detail) => {
            assert!(detail.contains("Missing websocket URL in config"));
            assert!(detail.contains("wssFeederServiceAggTrade"));
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn test_insecure_scheme_never_connects() {
    let server = config_server(r#"{"wssFeederServiceAggTrade":"http://x/y"}"#.to_string()).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let observer = Arc::new(Recorder(tx));
    let orchestrator = orchestrator(format!("{}/config.json", server.uri()), &observer);

    orchestrator.start();

    assert_eq!(next_event(&mut rx).await, LifecycleEvent::Started(None));
    assert!(matches!(next_event(&mut rx).await, LifecycleEvent::Error(_)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
}
