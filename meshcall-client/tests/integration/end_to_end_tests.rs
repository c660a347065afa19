use super::{init_tracing, spawn_server};
use crate::utils::fake_engine::{FakeEngineFactory, stream_from};
use anyhow::{Context, Result};
use meshcall_client::{ClientConfig, MeshClient, SyntheticMediaSource, TileState, VideoGrid};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const VIEW_TIMEOUT_MS: u64 = 2000;

async fn wait_for(
    view: &mut watch::Receiver<VideoGrid>,
    mut done: impl FnMut(&VideoGrid) -> bool,
) -> Result<()> {
    let timeout = Duration::from_millis(VIEW_TIMEOUT_MS);
    loop {
        if done(&view.borrow_and_update()) {
            return Ok(());
        }
        tokio::time::timeout(timeout, view.changed())
            .await
            .context("Timeout waiting for the view")?
            .context("Client stopped")?;
    }
}

#[tokio::test]
async fn test_two_clients_meet_through_server() -> Result<()> {
    init_tracing();
    let (addr, roster) = spawn_server().await;
    let config = ClientConfig::for_server(&addr.ip().to_string(), addr.port());

    let alice = MeshClient::join(
        &config,
        &SyntheticMediaSource,
        Arc::new(FakeEngineFactory::loopback()),
    )
    .await?;
    let bob = MeshClient::join(
        &config,
        &SyntheticMediaSource,
        Arc::new(FakeEngineFactory::loopback()),
    )
    .await?;
    let (alice_id, bob_id) = (alice.id(), bob.id());

    let mut alice_view = alice.view();
    let mut bob_view = bob.view();

    wait_for(&mut alice_view, |grid| {
        grid.tile(&bob_id)
            .is_some_and(|t| t.state == TileState::Live(stream_from(bob_id)))
    })
    .await?;
    wait_for(&mut bob_view, |grid| {
        grid.tile(&alice_id)
            .is_some_and(|t| t.state == TileState::Live(stream_from(alice_id)))
    })
    .await?;
    assert_eq!(alice_view.borrow().participant_count(), 2);

    let bob_media = bob.local_media().clone();
    bob.leave().await;
    assert!(bob_media.tracks().all(|t| t.is_ended()));

    wait_for(&mut alice_view, |grid| grid.is_empty()).await?;
    assert_eq!(roster.snapshot().await?, vec![alice_id]);

    alice.leave().await;
    Ok(())
}

#[tokio::test]
async fn test_toggles_do_not_touch_the_wire() -> Result<()> {
    init_tracing();
    let (addr, _roster) = spawn_server().await;
    let config = ClientConfig::for_server(&addr.ip().to_string(), addr.port());

    let alice_engines = FakeEngineFactory::loopback();
    let bob_engines = FakeEngineFactory::loopback();
    let mut alice =
        MeshClient::join(&config, &SyntheticMediaSource, Arc::new(alice_engines.clone())).await?;
    let bob = MeshClient::join(&config, &SyntheticMediaSource, Arc::new(bob_engines.clone())).await?;
    let (alice_id, bob_id) = (alice.id(), bob.id());

    let mut alice_view = alice.view();
    let mut bob_view = bob.view();
    wait_for(&mut alice_view, |grid| {
        grid.tile(&bob_id)
            .is_some_and(|t| matches!(t.state, TileState::Live(_)))
    })
    .await?;
    wait_for(&mut bob_view, |grid| {
        grid.tile(&alice_id)
            .is_some_and(|t| matches!(t.state, TileState::Live(_)))
    })
    .await?;

    let alice_received = alice_engines.log(&bob_id).received.len();
    let bob_received = bob_engines.log(&alice_id).received.len();
    assert_eq!((alice_received, bob_received), (1, 1), "offer and answer only");

    alice.toggle_video();
    alice.toggle_video();
    alice.toggle_audio();
    alice.toggle_audio();
    assert!(alice.local_media().video_track().unwrap().is_enabled());
    assert!(alice.local_media().audio_track().unwrap().is_enabled());
    assert_eq!(alice.video_indicator().label, "Turn Off Video");
    assert_eq!(alice.audio_indicator().label, "Turn Off Audio");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(alice_engines.log(&bob_id).received.len(), alice_received);
    assert_eq!(bob_engines.log(&alice_id).received.len(), bob_received);
    assert_eq!(alice_engines.engine_count(&bob_id), 1);
    assert_eq!(bob_engines.engine_count(&alice_id), 1);

    bob.leave().await;
    alice.leave().await;
    Ok(())
}
