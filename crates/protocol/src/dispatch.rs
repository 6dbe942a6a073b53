//! Typed message dispatch.
//!
//! Handlers implement [`MessageHandler`] and override the `on_*` methods they
//! care about. A [`DispatchRegistry`] routes each message to the handlers
//! subscribed to its kind, in subscription order.

use crate::message::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::trace;

/// Receives decoded messages. Every method defaults to doing nothing.
pub trait MessageHandler: Send + Sync {
    /// Serverbound handshake.
    fn on_handshake(&self, _msg: &Handshake) {}

    /// Serverbound status request.
    fn on_status_request(&self, _msg: &StatusRequest) {}

    /// Serverbound status ping.
    fn on_status_ping(&self, _msg: &StatusPing) {}

    /// Clientbound status response.
    fn on_status_response(&self, _msg: &StatusResponse) {}

    /// Clientbound status pong.
    fn on_status_pong(&self, _msg: &StatusPong) {}

    /// Serverbound login start.
    fn on_login_start(&self, _msg: &LoginStart) {}

    /// Clientbound disconnect during login.
    fn on_login_disconnect(&self, _msg: &LoginDisconnect) {}

    /// Clientbound encryption request.
    fn on_encryption_request(&self, _msg: &EncryptionRequest) {}

    /// Clientbound login success.
    fn on_login_success(&self, _msg: &LoginSuccess) {}

    /// Clientbound compression threshold.
    fn on_set_compression(&self, _msg: &SetCompression) {}

    /// Clientbound keep-alive.
    fn on_keep_alive_clientbound(&self, _msg: &KeepAliveClientbound) {}

    /// Serverbound keep-alive.
    fn on_keep_alive_serverbound(&self, _msg: &KeepAliveServerbound) {}

    /// Clientbound disconnect during play.
    fn on_play_disconnect(&self, _msg: &PlayDisconnect) {}

    /// Clientbound teleport.
    fn on_player_position_and_look(&self, _msg: &PlayerPositionAndLook) {}

    /// Serverbound teleport acknowledgement.
    fn on_teleport_confirm(&self, _msg: &TeleportConfirm) {}

    /// Serverbound position and rotation update.
    fn on_player_position_rotation(&self, _msg: &PlayerPositionRotation) {}

    /// Clientbound inventory transaction acknowledgement.
    fn on_confirm_transaction_clientbound(&self, _msg: &ConfirmTransactionClientbound) {}

    /// Serverbound transaction apology.
    fn on_confirm_transaction_serverbound(&self, _msg: &ConfirmTransactionServerbound) {}

    /// Serverbound inventory click.
    fn on_container_click(&self, _msg: &ContainerClick) {}

    /// Clientbound window open.
    fn on_open_window(&self, _msg: &OpenWindow) {}

    /// Clientbound window close.
    fn on_close_window_clientbound(&self, _msg: &CloseWindowClientbound) {}

    /// Serverbound window close.
    fn on_close_window_serverbound(&self, _msg: &CloseWindowServerbound) {}

    /// Clientbound single block update.
    fn on_block_change(&self, _msg: &BlockChange) {}

    /// Clientbound health update.
    fn on_update_health(&self, _msg: &UpdateHealth) {}

    /// Serverbound client status.
    fn on_client_status(&self, _msg: &ClientStatus) {}

    /// Clientbound difficulty.
    fn on_change_difficulty(&self, _msg: &ChangeDifficulty) {}

    /// Clientbound player abilities.
    fn on_player_abilities(&self, _msg: &PlayerAbilities) {}

    /// Serverbound client settings.
    fn on_client_settings(&self, _msg: &ClientSettings) {}

    /// Serverbound chat.
    fn on_chat(&self, _msg: &Chat) {}

    /// Serverbound advancement tab notification.
    fn on_seen_advancements(&self, _msg: &SeenAdvancements) {}

    /// Clientbound simulation distance.
    fn on_set_simulation_distance(&self, _msg: &SetSimulationDistance) {}

    /// Clientbound ping.
    fn on_ping(&self, _msg: &Ping) {}

    /// Serverbound pong.
    fn on_pong(&self, _msg: &Pong) {}

    /// Clientbound play packet this codec does not model.
    fn on_unparsed(&self, _msg: &Unparsed) {}
}

/// Route `message` to the matching `on_*` method of `handler`.
pub fn dispatch_message(handler: &dyn MessageHandler, message: &Message) {
    match message {
        Message::Handshake(msg) => handler.on_handshake(msg),
        Message::StatusRequest(msg) => handler.on_status_request(msg),
        Message::StatusPing(msg) => handler.on_status_ping(msg),
        Message::StatusResponse(msg) => handler.on_status_response(msg),
        Message::StatusPong(msg) => handler.on_status_pong(msg),
        Message::LoginStart(msg) => handler.on_login_start(msg),
        Message::LoginDisconnect(msg) => handler.on_login_disconnect(msg),
        Message::EncryptionRequest(msg) => handler.on_encryption_request(msg),
        Message::LoginSuccess(msg) => handler.on_login_success(msg),
        Message::SetCompression(msg) => handler.on_set_compression(msg),
        Message::KeepAliveClientbound(msg) => handler.on_keep_alive_clientbound(msg),
        Message::KeepAliveServerbound(msg) => handler.on_keep_alive_serverbound(msg),
        Message::PlayDisconnect(msg) => handler.on_play_disconnect(msg),
        Message::PlayerPositionAndLook(msg) => handler.on_player_position_and_look(msg),
        Message::TeleportConfirm(msg) => handler.on_teleport_confirm(msg),
        Message::PlayerPositionRotation(msg) => handler.on_player_position_rotation(msg),
        Message::ConfirmTransactionClientbound(msg) => handler.on_confirm_transaction_clientbound(msg),
        Message::ConfirmTransactionServerbound(msg) => handler.on_confirm_transaction_serverbound(msg),
        Message::ContainerClick(msg) => handler.on_container_click(msg),
        Message::OpenWindow(msg) => handler.on_open_window(msg),
        Message::CloseWindowClientbound(msg) => handler.on_close_window_clientbound(msg),
        Message::CloseWindowServerbound(msg) => handler.on_close_window_serverbound(msg),
        Message::BlockChange(msg) => handler.on_block_change(msg),
        Message::UpdateHealth(msg) => handler.on_update_health(msg),
        Message::ClientStatus(msg) => handler.on_client_status(msg),
        Message::ChangeDifficulty(msg) => handler.on_change_difficulty(msg),
        Message::PlayerAbilities(msg) => handler.on_player_abilities(msg),
        Message::ClientSettings(msg) => handler.on_client_settings(msg),
        Message::Chat(msg) => handler.on_chat(msg),
        Message::SeenAdvancements(msg) => handler.on_seen_advancements(msg),
        Message::SetSimulationDistance(msg) => handler.on_set_simulation_distance(msg),
        Message::Ping(msg) => handler.on_ping(msg),
        Message::Pong(msg) => handler.on_pong(msg),
        Message::Unparsed(msg) => handler.on_unparsed(msg),
    }
}

/// Handle returned by [`DispatchRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Dispatch failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A handler dispatched a message of the kind currently being dispatched.
    #[error("{0:?} dispatched from inside one of its own handlers")]
    Reentrant(MessageKind),
}

type Subscribers = HashMap<MessageKind, Vec<(SubscriberId, Arc<dyn MessageHandler>)>>;

thread_local! {
    static ACTIVE: RefCell<Vec<(usize, MessageKind)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a (registry, kind) pair as being dispatched on this thread.
struct ActiveDispatch {
    key: (usize, MessageKind),
}

impl ActiveDispatch {
    fn enter(registry: usize, kind: MessageKind) -> Result<Self, DispatchError> {
        let key = (registry, kind);
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&key) {
                return Err(DispatchError::Reentrant(kind));
            }
            active.push(key);
            Ok(Self { key })
        })
    }
}

impl Drop for ActiveDispatch {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|key| *key == self.key) {
                active.remove(pos);
            }
        });
    }
}

/// Per-kind subscriber lists.
///
/// Handlers may register or unregister from inside a dispatch; the change
/// applies from the next dispatch on.
pub struct DispatchRegistry {
    subscribers: RwLock<Subscribers>,
    next_id: AtomicU64,
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<MessageKind, usize> = subscribers
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("DispatchRegistry")
            .field("subscribers", &counts)
            .finish()
    }
}

impl DispatchRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe `handler` to each kind in `kinds`.
    pub fn register(
        &self,
        handler: Arc<dyn MessageHandler>,
        kinds: &[MessageKind],
    ) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for kind in kinds {
            let list = subscribers.entry(*kind).or_default();
            if !list.iter().any(|(existing, _)| *existing == id) {
                list.push((id, Arc::clone(&handler)));
            }
        }
        id
    }

    /// Remove every subscription made under `id`. Returns whether any existed.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for list in subscribers.values_mut() {
            let before = list.len();
            list.retain(|(existing, _)| *existing != id);
            removed |= list.len() != before;
        }
        subscribers.retain(|_, list| !list.is_empty());
        removed
    }

    /// Remove every subscription.
    pub fn unregister_all(&self) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of handlers subscribed to `kind`.
    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Deliver `message` to its subscribers and return how many were called.
    ///
    /// The subscriber list is snapshotted first, so no lock is held while
    /// handlers run.
    pub fn dispatch(&self, message: &Message) -> Result<usize, DispatchError> {
        let kind = message.kind();
        let _active = ActiveDispatch::enter(self as *const Self as usize, kind)?;
        let handlers: Vec<Arc<dyn MessageHandler>> = {
            let subscribers = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match subscribers.get(&kind) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => Vec::new(),
            }
        };
        trace!(?kind, handlers = handlers.len(), "dispatching");
        for handler in &handlers {
            dispatch_message(handler.as_ref(), message);
        }
        Ok(handlers.len())
    }
}
