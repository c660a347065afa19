use meshcall_core::{InboundSignal, ServerEvent};
use serde_json::json;

use crate::integration::{init_tracing, spawn_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_signal_stamped_with_sender() {
    init_tracing();

    let (addr, _roster) = spawn_server(std::env::temp_dir()).await;

    let mut a = TestClient::connect(addr).await.unwrap();
    a.snapshot().await.unwrap();
    let mut b = TestClient::connect(addr).await.unwrap();
    b.snapshot().await.unwrap();
    a.recv().await.unwrap(); // userJoined(b)

    let offer = json!({ "type": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\n" });
    a.send_signal(b.peer_id, offer.clone()).await.unwrap();

    assert_eq!(
        b.recv().await.unwrap(),
        ServerEvent::Signal(InboundSignal {
            from: a.peer_id,
            signal: offer,
        })
    );
}

#[tokio::test]
async fn test_forged_from_is_overwritten() {
    init_tracing();

    let (addr, _roster) = spawn_server(std::env::temp_dir()).await;

    let mut a = TestClient::connect(addr).await.unwrap();
    a.snapshot().await.unwrap();
    let mut b = TestClient::connect(addr).await.unwrap();
    b.snapshot().await.unwrap();
    let mut c = TestClient::connect(addr).await.unwrap();
    c.snapshot().await.unwrap();

    // A claims to be C.
    let forged = json!({
        "op": "signal",
        "d": { "to": b.peer_id, "from": c.peer_id, "signal": { "candidate": "c1" } }
    });
    a.send_raw(forged.to_string()).await.unwrap();

    match b.recv().await.unwrap() {
        ServerEvent::UserJoined(id) => assert_eq!(id, c.peer_id),
        other => panic!("Expected userJoined(c), got {:?}", other),
    }
    match b.recv().await.unwrap() {
        ServerEvent::Signal(InboundSignal { from, signal }) => {
            assert_eq!(from, a.peer_id);
            assert_ne!(from, c.peer_id);
            assert_eq!(signal, json!({ "candidate": "c1" }));
        }
        other => panic!("Expected signal, got {:?}", other),
    }
}
