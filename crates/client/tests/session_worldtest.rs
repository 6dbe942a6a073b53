//! Worldtest: Session Lifecycle
//!
//! Validates:
//! - Handshake and login start on connect
//! - Login success enters play and starts the tick loop
//! - Keep-alive, teleport, ping, abilities and death are answered
//! - Disconnect is idempotent and joins the tick loop
//! - Illegal packets and unknown ids tear the session down
//! - A status query pings, records latency and disconnects

use craftbot_client::{Client, ClientConfig, ClientContext, ClientError};
use craftbot_protocol::{
    ChangeDifficulty, ClientSettings, ClientStatus, ConnectionState, Direction,
    EncryptionRequest, Handshake, KeepAliveClientbound, KeepAliveServerbound, LoginStart,
    LoginSuccess, Message, MessageHandler, MessageKind, PacketCodec, Ping, PlayDisconnect,
    PlayerAbilities, PlayerPositionAndLook, Pong, ProtocolError, ProtocolVersion,
    SetCompression, StatusPing, StatusPong, StatusRequest, StatusResponse, TeleportConfirm,
    UpdateHealth, CLIENT_STATUS_RESPAWN, HANDSHAKE_LOGIN, HANDSHAKE_STATUS,
};
use craftbot_testkit::{init_test_logging, server_bytes, PacketLogSink, RecordingTransport};
use glam::DVec3;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

struct Harness {
    client: Client,
    codec: PacketCodec,
    transport: Arc<RecordingTransport>,
}

impl Harness {
    /// Connected client whose tick loop stays in its grace delay.
    fn connect(version: ProtocolVersion) -> Self {
        Self::connect_with(version, ClientConfig::default())
    }

    fn connect_with(version: ProtocolVersion, base: ClientConfig) -> Self {
        init_test_logging();
        let config = ClientConfig {
            protocol_version: version.number(),
            username: "tester".into(),
            sync_grace_ms: 60_000,
            ..base
        };
        let client = Client::new(ClientContext::new(config)).expect("client builds");
        let transport = Arc::new(RecordingTransport::new());
        client.connect(transport.clone()).expect("connect");
        Self {
            client,
            codec: PacketCodec::new(version).expect("codec"),
            transport,
        }
    }

    fn feed(&self, messages: &[Message]) -> Result<usize, ClientError> {
        let bytes = server_bytes(&self.codec, messages).expect("server bytes");
        self.client.on_bytes_received(&bytes)
    }

    fn login(&self) {
        let handled = self
            .feed(&[Message::LoginSuccess(LoginSuccess {
                uuid: Uuid::from_u128(0x1234),
                username: "tester".into(),
            })])
            .expect("login success handled");
        assert_eq!(handled, 1);
    }

    fn sent_since(&self, mark: usize) -> Vec<Message> {
        self.transport
            .messages_since(mark, &self.codec, ConnectionState::Play)
            .expect("sent frames decode")
    }
}

#[test]
fn session_lifecycle_worldtest() {
    let log_path = std::env::temp_dir().join("session_lifecycle_worldtest.jsonl");
    let mut packet_log = PacketLogSink::create(&log_path).expect("create packet log");

    for version in ProtocolVersion::SUPPORTED {
        println!("=== Session lifecycle, protocol {} ({}) ===", version.number(), version.release());
        let h = Harness::connect(version);

        // Phase 1: handshake and login start
        assert_eq!(h.client.state(), ConnectionState::Login);
        let frames = h.transport.frames();
        assert_eq!(frames.len(), 2);
        let handshake = h
            .transport
            .messages_since(0, &h.codec, ConnectionState::Handshake)
            .expect("handshake decodes");
        assert_eq!(
            handshake[0],
            Message::Handshake(Handshake {
                protocol_version: version.number() as i32,
                server_address: "127.0.0.1".into(),
                server_port: 25565,
                next_state: HANDSHAKE_LOGIN,
            })
        );
        let login = h
            .transport
            .messages_since(1, &h.codec, ConnectionState::Login)
            .expect("login start decodes");
        assert_eq!(
            login,
            vec![Message::LoginStart(LoginStart {
                username: "tester".into()
            })]
        );
        assert!(!h.client.is_ticking());
        assert!(h.client.world().is_none());

        // Phase 2: login success enters play
        h.login();
        assert_eq!(h.client.state(), ConnectionState::Play);
        assert!(h.client.is_ticking());
        assert!(h.client.world().is_some());
        assert_eq!(
            h.client.game_info().profile.map(|p| p.username),
            Some("tester".to_string())
        );

        // Phase 3: keep-alive and teleport are answered
        let mark = h.transport.mark();
        let teleport = Message::PlayerPositionAndLook(PlayerPositionAndLook {
            x: 8.5,
            y: 70.0,
            z: -4.5,
            yaw: 90.0,
            pitch: 0.0,
            flags: 0,
            teleport_id: 7,
            dismount_vehicle: version.has_dismount_flag().then_some(false),
        });
        let keepalive = Message::KeepAliveClientbound(KeepAliveClientbound { id: 42 });
        let handled = h
            .feed(&[keepalive.clone(), teleport.clone()])
            .expect("keep-alive and teleport handled");
        assert_eq!(handled, 2);
        packet_log.write(Direction::Clientbound, &keepalive).expect("log");
        packet_log.write(Direction::Clientbound, &teleport).expect("log");

        let replies = h.sent_since(mark);
        for reply in &replies {
            packet_log.write(Direction::Serverbound, reply).expect("log");
        }
        assert!(replies.contains(&Message::KeepAliveServerbound(KeepAliveServerbound { id: 42 })));
        assert!(replies.contains(&Message::TeleportConfirm(TeleportConfirm { teleport_id: 7 })));
        let player = h.client.player().expect("player exists in play");
        assert_eq!(player.lock().unwrap().position, DVec3::new(8.5, 70.0, -4.5));

        // Phase 4: disconnect joins the tick loop and is idempotent
        assert!(h.client.disconnect("test finished"));
        assert!(!h.client.disconnect("test finished again"));
        assert_eq!(h.client.state(), ConnectionState::Disconnected);
        assert!(!h.client.is_ticking());
        assert!(h.client.world().is_none());
        assert!(h.transport.is_closed());
    }

    assert!(packet_log.len() >= 4 * ProtocolVersion::SUPPORTED.len());
    println!("Packet log: {}", log_path.display());
}

#[test]
fn play_messages_get_their_replies() {
    let h = Harness::connect_with(
        ProtocolVersion::V1_18,
        ClientConfig {
            auto_respawn: true,
            ..ClientConfig::default()
        },
    );
    h.login();
    let mark = h.transport.mark();

    let abilities = PlayerAbilities {
        flags: 0x04,
        flying_speed: 0.05,
        fov_modifier: 0.1,
    };
    let handled = h
        .feed(&[
            Message::Ping(Ping { id: 31 }),
            Message::PlayerAbilities(abilities.clone()),
            Message::UpdateHealth(UpdateHealth {
                health: 0.0,
                food: 20,
                saturation: 0.0,
            }),
            Message::ChangeDifficulty(ChangeDifficulty {
                difficulty: 2,
                locked: Some(true),
            }),
        ])
        .expect("play messages handled");
    assert_eq!(handled, 4);

    let replies = h.sent_since(mark);
    assert!(replies.contains(&Message::Pong(Pong { id: 31 })));
    assert!(replies.contains(&Message::ClientSettings(ClientSettings::for_version(
        ProtocolVersion::V1_18,
        "en_us",
        10
    ))));
    assert!(replies.contains(&Message::ClientStatus(ClientStatus {
        action: CLIENT_STATUS_RESPAWN
    })));

    let info = h.client.game_info();
    let announced = info.abilities.clone().expect("abilities stored");
    assert!(announced.allows_flying());
    assert!(!announced.is_creative());
    assert_eq!(info.abilities, Some(abilities));
    assert_eq!(info.difficulty.map(|d| d.difficulty), Some(2));
    assert_eq!(
        h.client.entities().and_then(|e| e.health()).map(|hp| hp.food),
        Some(20)
    );
}

#[test]
fn compression_threshold_reaches_the_transport() {
    let h = Harness::connect(ProtocolVersion::V1_16_5);
    h.feed(&[Message::SetCompression(SetCompression { threshold: 256 })])
        .expect("set compression handled");
    assert_eq!(h.transport.compression_threshold(), Some(256));
    assert_eq!(h.client.state(), ConnectionState::Login);
}

#[test]
fn server_kick_tears_the_session_down() {
    let h = Harness::connect(ProtocolVersion::V1_14_4);
    h.login();
    let handled = h
        .feed(&[Message::PlayDisconnect(PlayDisconnect {
            reason: "{\"text\":\"bye\"}".into(),
        })])
        .expect("kick handled");
    assert_eq!(handled, 1);
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    assert!(!h.client.is_ticking());
    assert!(h.transport.is_closed());
    assert!(matches!(
        h.client.on_bytes_received(&[1, 0]),
        Err(ClientError::NotConnected)
    ));
}

#[test]
fn online_mode_servers_are_refused() {
    let h = Harness::connect(ProtocolVersion::V1_12_2);
    h.feed(&[Message::EncryptionRequest(EncryptionRequest {
        server_id: String::new(),
        public_key: vec![1, 2, 3],
        verify_token: vec![4, 5, 6, 7],
    })])
    .expect("encryption request handled");
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    assert!(h.transport.is_closed());
}

#[test]
fn illegal_messages_are_rejected_both_ways() {
    let h = Harness::connect(ProtocolVersion::V1_18);

    let outgoing = h
        .client
        .send(&Message::KeepAliveServerbound(KeepAliveServerbound { id: 1 }));
    assert!(matches!(
        outgoing,
        Err(ClientError::Protocol(ProtocolError::IllegalStateTransition {
            state: ConnectionState::Login,
            kind: MessageKind::KeepAliveServerbound,
        }))
    ));
    assert_eq!(h.client.state(), ConnectionState::Login);

    // A login-state id the table does not know.
    let incoming = h.client.on_bytes_received(&[2, 0x7f, 0x00]);
    assert!(matches!(
        incoming,
        Err(ClientError::Protocol(ProtocolError::UnknownPacketId { .. }))
    ));
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    assert!(h.transport.is_closed());
}

#[test]
fn trailing_bytes_disconnect() {
    let h = Harness::connect(ProtocolVersion::V1_18);
    h.login();
    let mut body = h
        .codec
        .encode(&Message::KeepAliveClientbound(KeepAliveClientbound { id: 3 }))
        .expect("encode");
    body.push(0xAA);
    let result = h.client.on_bytes_received(&craftbot_protocol::frame(&body));
    assert!(matches!(
        result,
        Err(ClientError::Protocol(ProtocolError::TrailingBytes { .. }))
    ));
    assert_eq!(h.client.state(), ConnectionState::Disconnected);
    assert!(!h.client.is_ticking());
}

#[test]
fn partial_frames_wait_for_the_rest() {
    let h = Harness::connect(ProtocolVersion::V1_17_1);
    let bytes = server_bytes(
        &h.codec,
        &[Message::LoginSuccess(LoginSuccess {
            uuid: Uuid::from_u128(7),
            username: "tester".into(),
        })],
    )
    .expect("server bytes");
    let (head, tail) = bytes.split_at(bytes.len() / 2);
    assert_eq!(h.client.on_bytes_received(head).expect("partial"), 0);
    assert_eq!(h.client.state(), ConnectionState::Login);
    assert_eq!(h.client.on_bytes_received(tail).expect("rest"), 1);
    assert_eq!(h.client.state(), ConnectionState::Play);
}

#[test]
fn construction_validates_version_and_name() {
    let bad_version = ClientConfig {
        protocol_version: 9999,
        ..ClientConfig::default()
    };
    assert!(matches!(
        Client::new(ClientContext::new(bad_version)),
        Err(ClientError::Protocol(
            ProtocolError::UnsupportedProtocolVersion { version: 9999, .. }
        ))
    ));

    let long_name = ClientConfig {
        username: "a_name_that_is_far_too_long".into(),
        ..ClientConfig::default()
    };
    assert!(matches!(
        Client::new(ClientContext::new(long_name)),
        Err(ClientError::Config(_))
    ));
}

#[test]
fn status_query_pings_then_disconnects() {
    init_test_logging();
    let version = ProtocolVersion::V1_16_5;
    let config = ClientConfig {
        protocol_version: version.number(),
        ..ClientConfig::default()
    };
    let client = Client::new(ClientContext::new(config)).expect("client builds");
    let codec = PacketCodec::new(version).expect("codec");
    let transport = Arc::new(RecordingTransport::new());
    client.query_status(transport.clone()).expect("status query");
    assert_eq!(client.state(), ConnectionState::Status);

    let handshake = transport
        .messages_since(0, &codec, ConnectionState::Handshake)
        .expect("handshake decodes");
    assert!(matches!(
        handshake.as_slice(),
        [Message::Handshake(Handshake { next_state: HANDSHAKE_STATUS, .. })]
    ));
    let request = transport
        .messages_since(1, &codec, ConnectionState::Status)
        .expect("request decodes");
    assert_eq!(request, vec![Message::StatusRequest(StatusRequest {})]);

    let mark = transport.mark();
    let json = r#"{"version":{"name":"1.16.5","protocol":754}}"#;
    let bytes = server_bytes(
        &codec,
        &[Message::StatusResponse(StatusResponse { json: json.into() })],
    )
    .expect("response bytes");
    client.on_bytes_received(&bytes).expect("response handled");
    assert_eq!(client.game_info().status_json.as_deref(), Some(json));
    let ping = transport
        .messages_since(mark, &codec, ConnectionState::Status)
        .expect("ping decodes");
    let [Message::StatusPing(StatusPing { payload })] = ping.as_slice() else {
        panic!("expected one status ping, got {ping:?}");
    };

    let bytes = server_bytes(
        &codec,
        &[Message::StatusPong(StatusPong { payload: *payload })],
    )
    .expect("pong bytes");
    client.on_bytes_received(&bytes).expect("pong handled");
    assert!(client.game_info().status_latency.is_some());
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(transport.is_closed());
}

#[derive(Default)]
struct KeepAliveCounter {
    seen: AtomicUsize,
}

impl MessageHandler for KeepAliveCounter {
    fn on_keep_alive_clientbound(&self, _msg: &KeepAliveClientbound) {
        self.seen.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn observers_see_messages_until_unsubscribed() {
    let h = Harness::connect(ProtocolVersion::V1_15_2);
    h.login();
    let counter = Arc::new(KeepAliveCounter::default());
    let id = h
        .client
        .subscribe(counter.clone(), &[MessageKind::KeepAliveClientbound]);

    let keepalive = Message::KeepAliveClientbound(KeepAliveClientbound { id: 1 });
    h.feed(&[keepalive.clone()]).expect("first keep-alive");
    assert_eq!(counter.seen.load(Ordering::SeqCst), 1);

    assert!(h.client.unsubscribe(id));
    h.feed(&[keepalive]).expect("second keep-alive");
    assert_eq!(counter.seen.load(Ordering::SeqCst), 1);
    assert!(!h.client.unsubscribe(id));
}

#[test]
fn death_without_auto_respawn_stays_quiet() {
    let h = Harness::connect(ProtocolVersion::V1_16_5);
    assert!(!h.client.context().config.auto_respawn);
    h.login();
    let mark = h.transport.mark();
    h.feed(&[Message::UpdateHealth(UpdateHealth {
        health: 0.0,
        food: 0,
        saturation: 0.0,
    })])
    .expect("health handled");
    assert!(h
        .sent_since(mark)
        .iter()
        .all(|m| m.kind() != MessageKind::ClientStatus));
    assert_eq!(h.client.entities().and_then(|e| e.health()).map(|hp| hp.health), Some(0.0));
}
