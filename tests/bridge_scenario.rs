//! End-to-end scenarios over a real WebSocket.
//!
//! The test plays the game: it connects to the bridge's server with a
//! `tokio-tungstenite` client and exchanges wire messages.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing_subscriber::EnvFilter;

use redeem_bridge::protocol::ResultBody;
use redeem_bridge::{
    Body, Bridge, Cart, ConnectionState, GameServer, Guid, IngameFlag, Message, Redeem,
    RedeemSource, TwitchUser,
};

// ============================================================================
// Helpers
// ============================================================================

type GameClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_test_writer()
        .try_init();
}

async fn start_bridge(ingame: &IngameFlag) -> Result<(Bridge, String)> {
    init_tracing();

    let bridge = Bridge::builder()
        .resend_interval(Duration::from_millis(100))
        .redeem_timeout(WAIT)
        .state_sink(ingame.clone())
        .build()?;

    let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
    let url = server.ws_url();
    tokio::spawn(server.serve(bridge.clone()));

    Ok((bridge, url))
}

async fn send(client: &mut GameClient, message: &Message) -> Result<()> {
    client.send(WsMessage::text(message.encode()?)).await?;
    Ok(())
}

async fn next_message(client: &mut GameClient) -> Result<Message> {
    loop {
        let frame = timeout(WAIT, client.next())
            .await
            .context("timed out waiting for the bridge")?
            .context("bridge closed the socket")??;

        match frame {
            WsMessage::Text(text) => return Ok(Message::decode(text.as_str())?),
            WsMessage::Close(frame) => bail!("bridge sent close: {frame:?}"),
            _ => continue,
        }
    }
}

async fn connect_and_handshake(url: &str) -> Result<GameClient> {
    let (mut client, _) = connect_async(url).await?;

    send(
        &mut client,
        &Message::new(Body::Hello {
            version: "0.1.0".into(),
        }),
    )
    .await?;

    let reply = next_message(&mut client).await?;
    if reply.body != (Body::HelloBack { allowed: true }) {
        bail!("unexpected handshake reply: {reply:?}");
    }

    Ok(client)
}

fn redeem() -> Redeem {
    Redeem {
        id: "give_item".into(),
        title: "Give Item".into(),
        description: "Gives the player an item".into(),
        image: String::new(),
        price: 250,
        sku: "sku-item".into(),
        announce: Some(false),
    }
}

fn cart() -> Cart {
    Cart {
        id: "give_item".into(),
        sku: "sku-item".into(),
        args: BTreeMap::from([("item".to_string(), "sword".to_string())]),
    }
}

fn user() -> TwitchUser {
    TwitchUser {
        id: "42".into(),
        login: "someviewer".into(),
        display_name: "SomeViewer".into(),
    }
}

fn result_for(guid: &Guid, success: bool) -> Message {
    Message::with_guid(
        guid.clone(),
        Body::Result(ResultBody {
            success,
            payload: Some(json!({ "message": "done" })),
        }),
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_handshake_ping_and_redeem() -> Result<()> {
    let ingame = IngameFlag::new();
    let (bridge, url) = start_bridge(&ingame).await?;

    let mut client = connect_and_handshake(&url).await?;
    assert!(bridge.is_handshaked());

    // Ping
    send(&mut client, &Message::new(Body::Ping)).await?;
    assert_eq!(next_message(&mut client).await?.body, Body::Pong);

    // In-game status
    send(
        &mut client,
        &Message::new(Body::IngameStateChanged { ingame: true }),
    )
    .await?;

    // Redeem
    let task = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .submit_redeem(&redeem(), &cart(), &user(), "tx-1")
                .await
        })
    };

    let request = next_message(&mut client).await?;
    assert_eq!(request.guid.as_str(), "tx-1");
    let Body::Redeem(body) = &request.body else {
        bail!("expected redeem, got {:?}", request.body);
    };
    assert_eq!(body.source, RedeemSource::Viewer);
    assert_eq!(body.command, "give_item");
    assert!(!body.announce);
    assert_eq!(body.args.get("item").map(String::as_str), Some("sword"));
    assert_eq!(body.user.display_name, "SomeViewer");

    send(&mut client, &result_for(&request.guid, true)).await?;

    let result = task.await??;
    assert!(result.success);
    assert_eq!(result.guid.as_str(), "tx-1");
    assert_eq!(result.payload_str("message"), Some("done"));

    // Socket events are handled in order, so the status change landed first
    assert!(ingame.get());

    let stats = bridge.stats().await?;
    assert_eq!(stats.pending_redeems, 0);
    assert_eq!(stats.state, ConnectionState::Handshaked);

    bridge.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_version_mismatch_is_reported() -> Result<()> {
    let (bridge, url) = start_bridge(&IngameFlag::new()).await?;
    let (mut client, _) = connect_async(url.as_str()).await?;

    send(
        &mut client,
        &Message::new(Body::Hello {
            version: "9.9.9".into(),
        }),
    )
    .await?;

    assert_eq!(
        next_message(&mut client).await?.body,
        Body::HelloBack { allowed: false }
    );

    bridge.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_redeem_survives_reconnect() -> Result<()> {
    let ingame = IngameFlag::new();
    let (bridge, url) = start_bridge(&ingame).await?;

    // First game session goes away without answering
    let mut first = connect_and_handshake(&url).await?;
    send(
        &mut first,
        &Message::new(Body::IngameStateChanged { ingame: true }),
    )
    .await?;
    first.close(None).await?;

    let mut state = bridge.connection().subscribe_state();
    timeout(
        WAIT,
        state.wait_for(|s| *s == ConnectionState::Disconnected),
    )
    .await
    .context("bridge did not notice the disconnect")??;
    assert!(!ingame.get());

    // Submitted while no game is connected
    let task = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .submit_redeem(&redeem(), &cart(), &user(), "tx-offline")
                .await
        })
    };

    // Second session receives the queued redeem after its handshake
    let mut second = connect_and_handshake(&url).await?;
    let request = next_message(&mut second).await?;
    assert_eq!(request.guid.as_str(), "tx-offline");
    assert!(matches!(request.body, Body::Redeem(_)));

    send(&mut second, &result_for(&request.guid, false)).await?;

    let result = task.await??;
    assert!(!result.success);

    bridge.shutdown();
    Ok(())
}
