//! Outgoing side of a session: state check, encode, frame, write.

use crate::error::{ClientError, Result};
use craftbot_protocol::{frame, ConnectionStateMachine, Message, PacketCodec, Transport};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// Serialises messages onto the attached transport.
///
/// Both the receive path and the tick thread send through the same outbox.
pub struct Outbox {
    codec: Arc<PacketCodec>,
    state: Arc<ConnectionStateMachine>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox")
            .field("version", &self.codec.version())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Outbox {
    /// Outbox without a transport.
    pub fn new(codec: Arc<PacketCodec>, state: Arc<ConnectionStateMachine>) -> Self {
        Self {
            codec,
            state,
            transport: RwLock::new(None),
        }
    }

    /// Codec used for encoding.
    pub fn codec(&self) -> &PacketCodec {
        &self.codec
    }

    /// Use `transport` for every later send.
    pub fn attach(&self, transport: Arc<dyn Transport>) {
        *self.transport.write().unwrap_or_else(PoisonError::into_inner) = Some(transport);
    }

    /// Drop and close the transport, if any.
    pub fn detach(&self) {
        let transport = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(transport) = transport {
            debug!("closing transport");
            transport.close();
        }
    }

    /// Whether a transport is attached.
    pub fn is_connected(&self) -> bool {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forward a compression threshold to the transport.
    pub fn set_compression(&self, threshold: i32) {
        if let Some(transport) = self.transport() {
            transport.set_compression_threshold(threshold);
        }
    }

    /// Send one message.
    ///
    /// Fails with `IllegalStateTransition` when the message is not legal in
    /// the current state, and with `NotConnected` when no transport is
    /// attached. A successful send applies the message's state transition.
    pub fn send(&self, message: &Message) -> Result<()> {
        self.state.check_outgoing(message.kind())?;
        let transport = self.transport().ok_or(ClientError::NotConnected)?;
        let body = self.codec.encode(message)?;
        transport.send_bytes(&frame(&body))?;
        trace!(kind = ?message.kind(), len = body.len(), "sent packet");
        self.state.on_sent(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftbot_protocol::{Handshake, KeepAliveServerbound, ProtocolVersion, ConnectionState};
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        frames: Mutex<Vec<Vec<u8>>>,
        closed: Mutex<bool>,
    }

    impl Transport for Capture {
        fn send_bytes(&self, bytes: &[u8]) -> io::Result<()> {
            self.frames.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        fn close(&self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    fn outbox() -> (Outbox, Arc<ConnectionStateMachine>) {
        let codec = Arc::new(PacketCodec::new(ProtocolVersion::V1_18).unwrap());
        let state = Arc::new(ConnectionStateMachine::new());
        (Outbox::new(codec, Arc::clone(&state)), state)
    }

    #[test]
    fn send_without_transport_fails() {
        let (outbox, state) = outbox();
        state.connect().unwrap();
        let handshake = Message::Handshake(Handshake {
            protocol_version: 757,
            server_address: "localhost".into(),
            server_port: 25565,
            next_state: 2,
        });
        assert!(matches!(outbox.send(&handshake), Err(ClientError::NotConnected)));
        assert_eq!(state.state(), ConnectionState::Handshake);
    }

    #[test]
    fn handshake_send_moves_to_login() {
        let (outbox, state) = outbox();
        let capture = Arc::new(Capture::default());
        state.connect().unwrap();
        outbox.attach(capture.clone());
        outbox
            .send(&Message::Handshake(Handshake {
                protocol_version: 757,
                server_address: "localhost".into(),
                server_port: 25565,
                next_state: 2,
            }))
            .unwrap();
        assert_eq!(state.state(), ConnectionState::Login);
        assert_eq!(capture.frames.lock().unwrap().len(), 1);

        let keepalive = Message::KeepAliveServerbound(KeepAliveServerbound { id: 1 });
        assert!(matches!(
            outbox.send(&keepalive),
            Err(ClientError::Protocol(_))
        ));

        outbox.detach();
        assert!(*capture.closed.lock().unwrap());
        assert!(!outbox.is_connected());
    }
}
