//! Worldtest: Inventory Transactions
//!
//! Validates:
//! - Ids come from the window counter and advance it
//! - A rejected click is answered by exactly one apology
//! - Concurrent clicks on one window get contiguous ids
//! - Unknown acknowledgements and closed windows are handled locally
//! - Versions without acknowledgements keep nothing pending
//! - A wrapped counter never reissues an id that is still pending

use craftbot_client::{AckOutcome, Client, ClientConfig, ClientContext, ClientError};
use craftbot_protocol::{
    CloseWindowClientbound, ConfirmTransactionClientbound, ConfirmTransactionServerbound,
    ConnectionState, ContainerClick, LoginSuccess, Message, MessageKind, OpenWindow,
    PacketCodec, ProtocolVersion, WindowType,
};
use craftbot_testkit::{init_test_logging, server_bytes, RecordingTransport};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

const CHEST: u8 = 3;

fn playing_client(version: ProtocolVersion) -> (Client, PacketCodec, Arc<RecordingTransport>) {
    init_test_logging();
    let config = ClientConfig {
        protocol_version: version.number(),
        sync_grace_ms: 60_000,
        ..ClientConfig::default()
    };
    let client = Client::new(ClientContext::new(config)).expect("client builds");
    let transport = Arc::new(RecordingTransport::new());
    client.connect(transport.clone()).expect("connect");
    let codec = PacketCodec::new(version).expect("codec");

    let window_type = if version.uses_legacy_open_window() {
        WindowType::Legacy {
            name: "minecraft:chest".into(),
            slot_count: 27,
            horse_entity_id: None,
        }
    } else {
        WindowType::Registry { id: 2 }
    };
    let bytes = server_bytes(
        &codec,
        &[
            Message::LoginSuccess(LoginSuccess {
                uuid: Uuid::from_u128(99),
                username: "craftbot".into(),
            }),
            Message::OpenWindow(OpenWindow {
                window_id: i32::from(CHEST),
                window_type,
                title: "{\"text\":\"Chest\"}".into(),
            }),
        ],
    )
    .expect("server bytes");
    assert_eq!(client.on_bytes_received(&bytes).expect("login handled"), 2);
    (client, codec, transport)
}

fn click(version: ProtocolVersion, slot: i16) -> ContainerClick {
    ContainerClick::new(version, CHEST, slot, 0, 0)
}

#[test]
fn rejected_click_gets_one_apology() {
    let version = ProtocolVersion::V1_12_2;
    let (client, codec, transport) = playing_client(version);
    let inventory = client.inventory().expect("inventory in play");
    let transactions = client.transactions().expect("tracker in play");
    assert_eq!(inventory.window(CHEST).expect("chest open").next_transaction_id, 0);

    // Phase 1: the click takes id 0 and the counter moves to 1
    let mark = transport.mark();
    let id = client
        .send_inventory_transaction(CHEST, click(version, 4))
        .expect("click sent");
    assert_eq!(id, 0);
    assert_eq!(inventory.window(CHEST).expect("chest open").next_transaction_id, 1);
    assert_eq!(transactions.pending_count(), 1);

    let sent = transport
        .messages_since(mark, &codec, ConnectionState::Play)
        .expect("click decodes");
    match sent.as_slice() {
        [Message::ContainerClick(sent)] => {
            assert_eq!(sent.window_id, CHEST);
            assert_eq!(sent.action_number, Some(0));
            assert_eq!(sent.slot, 4);
        }
        other => panic!("expected one click, got {other:?}"),
    }

    // Phase 2: the server rejects it
    let mark = transport.mark();
    let ack = server_bytes(
        &codec,
        &[Message::ConfirmTransactionClientbound(ConfirmTransactionClientbound {
            window_id: CHEST as i8,
            action_number: 0,
            accepted: false,
        })],
    )
    .expect("ack bytes");
    assert_eq!(client.on_bytes_received(&ack).expect("ack handled"), 1);

    let apologies: Vec<Message> = transport
        .messages_since(mark, &codec, ConnectionState::Play)
        .expect("apology decodes")
        .into_iter()
        .filter(|m| m.kind() == MessageKind::ConfirmTransactionServerbound)
        .collect();
    assert_eq!(
        apologies,
        vec![Message::ConfirmTransactionServerbound(ConfirmTransactionServerbound {
            window_id: 3,
            action_number: 0,
            accepted: false,
        })]
    );
    assert_eq!(transactions.pending_count(), 0);

    // Phase 3: a repeated acknowledgement is unknown and sends nothing
    let mark = transport.mark();
    assert_eq!(transactions.acknowledge(CHEST, 0, false), AckOutcome::Unknown);
    assert_eq!(transport.mark(), mark);
}

#[test]
fn accepted_click_sends_nothing_back() {
    let version = ProtocolVersion::V1_15_2;
    let (client, _codec, transport) = playing_client(version);
    let transactions = client.transactions().expect("tracker in play");

    client
        .send_inventory_transaction(CHEST, click(version, 0))
        .expect("first click");
    let id = client
        .send_inventory_transaction(CHEST, click(version, 1))
        .expect("second click");
    assert_eq!(id, 1);

    let mark = transport.mark();
    assert_eq!(transactions.acknowledge(CHEST, 1, true), AckOutcome::Accepted);
    assert_eq!(transport.mark(), mark);
    assert!(transactions.pending(CHEST, 0).is_some());
    assert!(transactions.pending(CHEST, 1).is_none());
}

#[test]
fn concurrent_clicks_get_contiguous_ids() {
    let version = ProtocolVersion::V1_16_5;
    let (client, _codec, _transport) = playing_client(version);
    let transactions = client.transactions().expect("tracker in play");
    client
        .send_inventory_transaction(CHEST, click(version, 0))
        .expect("warm-up click");
    let start = client
        .inventory()
        .and_then(|inv| inv.window(CHEST))
        .expect("chest open")
        .next_transaction_id;

    let workers: Vec<_> = (0..16)
        .map(|slot| {
            let transactions = Arc::clone(&transactions);
            thread::spawn(move || {
                transactions
                    .begin_transaction(CHEST, click(version, slot))
                    .expect("click sent")
            })
        })
        .collect();
    let mut ids: Vec<i16> = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker finished"))
        .collect();
    ids.sort_unstable();

    let expected: Vec<i16> = (start..start + 16).collect();
    assert_eq!(ids, expected);
    assert_eq!(transactions.pending_count(), 17);
}

#[test]
fn closing_the_window_drops_pending_clicks() {
    let version = ProtocolVersion::V1_13_2;
    let (client, codec, _transport) = playing_client(version);
    let transactions = client.transactions().expect("tracker in play");
    client
        .send_inventory_transaction(CHEST, click(version, 2))
        .expect("click sent");
    assert_eq!(transactions.pending_count(), 1);

    let close = server_bytes(
        &codec,
        &[Message::CloseWindowClientbound(CloseWindowClientbound { window_id: CHEST })],
    )
    .expect("close bytes");
    client.on_bytes_received(&close).expect("close handled");
    assert_eq!(transactions.pending_count(), 0);
    assert!(matches!(
        client.send_inventory_transaction(CHEST, click(version, 2)),
        Err(ClientError::UnknownWindow(CHEST))
    ));
}

#[test]
fn client_side_close_notifies_the_server() {
    let version = ProtocolVersion::V1_14_4;
    let (client, codec, transport) = playing_client(version);
    let mark = transport.mark();
    client.close_window(CHEST).expect("window closed");
    let sent = transport
        .messages_since(mark, &codec, ConnectionState::Play)
        .expect("close decodes");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind(), MessageKind::CloseWindowServerbound);
    assert!(matches!(
        client.close_window(CHEST),
        Err(ClientError::UnknownWindow(CHEST))
    ));
}

#[test]
fn apology_with_transport_down_is_skipped() {
    let version = ProtocolVersion::V1_12_2;
    let (client, _codec, transport) = playing_client(version);
    let transactions = client.transactions().expect("tracker in play");
    client
        .send_inventory_transaction(CHEST, click(version, 0))
        .expect("click sent");

    transport.set_failing(true);
    assert_eq!(
        transactions.acknowledge(CHEST, 0, false),
        AckOutcome::Rejected { apologized: false }
    );
    assert_eq!(transactions.pending_count(), 0);

    assert!(matches!(
        client.send_inventory_transaction(CHEST, click(version, 1)),
        Err(ClientError::Transport(_))
    ));
    assert_eq!(transactions.pending_count(), 0);
}

#[test]
fn versions_without_acks_keep_nothing_pending() {
    for version in [ProtocolVersion::V1_17_1, ProtocolVersion::V1_18] {
        let (client, codec, transport) = playing_client(version);
        let transactions = client.transactions().expect("tracker in play");
        let mark = transport.mark();

        assert_eq!(
            client
                .send_inventory_transaction(CHEST, click(version, 5))
                .expect("click sent"),
            0
        );
        assert_eq!(
            client
                .send_inventory_transaction(CHEST, click(version, 6))
                .expect("click sent"),
            1
        );
        assert_eq!(transactions.pending_count(), 0);

        let sent = transport
            .messages_since(mark, &codec, ConnectionState::Play)
            .expect("clicks decode");
        for message in &sent {
            let Message::ContainerClick(click) = message else {
                panic!("unexpected {message:?}");
            };
            assert_eq!(click.action_number, None);
            assert!(click.changed_slots.is_some());
        }
    }
}

#[test]
fn wrapped_counter_refuses_pending_ids() {
    let version = ProtocolVersion::V1_12_2;
    let (client, _codec, transport) = playing_client(version);
    let transactions = client.transactions().expect("tracker in play");
    let inventory = client.inventory().expect("inventory in play");
    let id_space = i16::MAX as usize + 1;

    // Phase 1: every id of the window is handed out once
    for n in 0..id_space {
        let slot = (n % 27) as i16;
        let id = transactions
            .begin_transaction(CHEST, click(version, slot))
            .expect("click sent");
        assert_eq!(id as usize, n);
    }
    assert_eq!(transactions.pending_count(), id_space);
    assert_eq!(inventory.window(CHEST).expect("chest open").next_transaction_id, 0);

    // Phase 2: the wrapped counter points at id 0, which is still pending
    let mark = transport.mark();
    assert!(matches!(
        transactions.begin_transaction(CHEST, click(version, 10)),
        Err(ClientError::TransactionIdsExhausted {
            window_id: CHEST,
            transaction_id: 0
        })
    ));
    assert_eq!(transport.mark(), mark, "refused click reached the transport");
    assert_eq!(inventory.window(CHEST).expect("chest open").next_transaction_id, 0);
    assert_eq!(transactions.pending_count(), id_space);
    let first = transactions.pending(CHEST, 0).expect("first click still pending");
    assert_eq!(first.action.slot, 0);

    // Phase 3: once id 0 is acknowledged it can be reused
    assert_eq!(transactions.acknowledge(CHEST, 0, true), AckOutcome::Accepted);
    assert_eq!(
        transactions
            .begin_transaction(CHEST, click(version, 10))
            .expect("click sent"),
        0
    );
    assert_eq!(transactions.pending(CHEST, 0).expect("pending").action.slot, 10);
    assert!(matches!(
        transactions.begin_transaction(CHEST, click(version, 11)),
        Err(ClientError::TransactionIdsExhausted { transaction_id: 1, .. })
    ));
}
