//! Session façade: connection lifecycle, receive path and subsystem wiring.

use crate::context::ClientContext;
use crate::entity::EntityManager;
use crate::error::{ClientError, Result};
use crate::inventory::InventoryManager;
use crate::outbox::Outbox;
use crate::tick::{TickScheduler, TickSettings, TickShared};
use crate::transaction::TransactionTracker;
use crate::world::SharedWorld;
use craftbot_physics::PlayerState;
use craftbot_protocol::{
    ChangeDifficulty, ClientSettings, ClientStatus, CloseWindowServerbound, ConnectionState,
    ConnectionStateMachine, ContainerClick, Direction, DispatchRegistry, EncryptionRequest,
    FrameSplitter, Handshake, KeepAliveClientbound, KeepAliveServerbound, LoginDisconnect,
    LoginStart, LoginSuccess, Message, MessageHandler, MessageKind, PacketCodec, Ping,
    PlayDisconnect, PlayerAbilities, PlayerPositionAndLook, Pong, ProtocolVersion,
    SetCompression, StatusPing, StatusPong, StatusRequest, StatusResponse, SubscriberId,
    TeleportConfirm, Transport, UpdateHealth, CLIENT_STATUS_RESPAWN, HANDSHAKE_LOGIN,
    HANDSHAKE_STATUS,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, Weak};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Longest username the login sequence accepts.
pub const MAX_USERNAME_LEN: usize = 16;

/// Server-announced facts that outlive a single message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameInfo {
    /// Name and uuid confirmed at login.
    pub profile: Option<LoginSuccess>,
    /// Last difficulty update.
    pub difficulty: Option<ChangeDifficulty>,
    /// Last abilities update.
    pub abilities: Option<PlayerAbilities>,
    /// Server list document from a status query.
    pub status_json: Option<String>,
    /// Round trip of the status ping.
    pub status_latency: Option<Duration>,
}

/// Subsystems that exist only while in play.
struct Managers {
    world: Arc<SharedWorld>,
    entities: Arc<EntityManager>,
    inventory: Arc<InventoryManager>,
    transactions: Arc<TransactionTracker>,
    subscribers: Vec<SubscriberId>,
}

struct Session {
    context: ClientContext,
    codec: Arc<PacketCodec>,
    state: Arc<ConnectionStateMachine>,
    outbox: Arc<Outbox>,
    registry: Arc<DispatchRegistry>,
    splitter: Mutex<FrameSplitter>,
    managers: RwLock<Option<Managers>>,
    tick: Mutex<Option<TickScheduler>>,
    game: Mutex<GameInfo>,
    status_ping_sent: Mutex<Option<Instant>>,
}

/// A protocol client bound to one protocol version.
///
/// Feed received bytes to [`Client::on_bytes_received`]; everything the
/// client sends goes to the transport given to [`Client::connect`].
pub struct Client {
    session: Arc<Session>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("version", &self.session.codec.version())
            .field("state", &self.session.state.state())
            .finish()
    }
}

impl Client {
    /// Build a client for the configured protocol version.
    ///
    /// Every kind the client sends on its own is looked up here, so a
    /// version that lacks one fails now instead of mid-session.
    pub fn new(context: ClientContext) -> Result<Self> {
        let config = &context.config;
        if config.username.is_empty() || config.username.len() > MAX_USERNAME_LEN {
            return Err(ClientError::Config(format!(
                "username must be 1 to {MAX_USERNAME_LEN} bytes, got {:?}",
                config.username
            )));
        }
        let version = config.protocol()?;
        let codec = Arc::new(PacketCodec::new(version)?);
        for kind in required_kinds(version) {
            codec.require(kind)?;
        }

        let state = Arc::new(ConnectionStateMachine::new());
        let outbox = Arc::new(Outbox::new(Arc::clone(&codec), Arc::clone(&state)));
        let session = Arc::new(Session {
            context,
            codec,
            state,
            outbox,
            registry: Arc::new(DispatchRegistry::new()),
            splitter: Mutex::new(FrameSplitter::new()),
            managers: RwLock::new(None),
            tick: Mutex::new(None),
            game: Mutex::new(GameInfo::default()),
            status_ping_sent: Mutex::new(None),
        });
        session.registry.register(
            Arc::new(SessionHandler {
                session: Arc::downgrade(&session),
            }),
            SessionHandler::SUBSCRIPTIONS,
        );
        info!(
            version = version.number(),
            release = version.release(),
            username = %session.context.config.username,
            "client ready"
        );
        Ok(Self { session })
    }

    /// Start a login on `transport`: handshake, then login start.
    pub fn connect(&self, transport: Arc<dyn Transport>) -> Result<()> {
        let session = &self.session;
        session.open(transport)?;
        let config = &session.context.config;
        let result = session
            .send(&session.handshake(HANDSHAKE_LOGIN))
            .and_then(|()| {
                session.send(&Message::LoginStart(LoginStart {
                    username: config.username.clone(),
                }))
            });
        if let Err(err) = result {
            session.disconnect("login could not be sent");
            return Err(err);
        }
        info!(server = %config.server_address, port = config.server_port, "login started");
        Ok(())
    }

    /// Start a server list query on `transport`.
    ///
    /// The response lands in [`GameInfo::status_json`]; the client then
    /// pings and disconnects once the pong arrives.
    pub fn query_status(&self, transport: Arc<dyn Transport>) -> Result<()> {
        let session = &self.session;
        session.open(transport)?;
        let result = session
            .send(&session.handshake(HANDSHAKE_STATUS))
            .and_then(|()| session.send(&Message::StatusRequest(StatusRequest {})));
        if let Err(err) = result {
            session.disconnect("status query could not be sent");
            return Err(err);
        }
        Ok(())
    }

    /// Feed bytes read from the transport.
    ///
    /// Complete packets are decoded and dispatched in order. Any decode,
    /// state or dispatch failure disconnects and is returned. Returns the
    /// number of packets handled.
    pub fn on_bytes_received(&self, bytes: &[u8]) -> Result<usize> {
        self.session.receive(bytes)
    }

    /// Send a message in the current state.
    pub fn send(&self, message: &Message) -> Result<()> {
        self.session.send(message)
    }

    /// Send an inventory click with a fresh transaction id.
    pub fn send_inventory_transaction(&self, window_id: u8, click: ContainerClick) -> Result<i16> {
        let transactions = self.transactions().ok_or(ClientError::NotConnected)?;
        transactions.begin_transaction(window_id, click)
    }

    /// Close a container window on both sides.
    pub fn close_window(&self, window_id: u8) -> Result<()> {
        let managers = self.session.managers();
        let managers = managers.as_ref().ok_or(ClientError::NotConnected)?;
        if managers.inventory.window(window_id).is_none() {
            return Err(ClientError::UnknownWindow(window_id));
        }
        self.session
            .send(&Message::CloseWindowServerbound(CloseWindowServerbound { window_id }))?;
        managers.inventory.close_window(window_id);
        managers.transactions.drop_window(window_id);
        Ok(())
    }

    /// Add an observer for `kinds`.
    ///
    /// Observers survive disconnects and reconnects; they are dropped with the client.
    pub fn subscribe(
        &self,
        handler: Arc<dyn MessageHandler>,
        kinds: &[MessageKind],
    ) -> SubscriberId {
        self.session.registry.register(handler, kinds)
    }

    /// Remove an observer added with [`Client::subscribe`].
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.session.registry.unregister(id)
    }

    /// Tear the session down. Safe to call any number of times.
    ///
    /// Returns whether anything was torn down.
    pub fn disconnect(&self, reason: &str) -> bool {
        self.session.disconnect(reason)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.session.state.state()
    }

    /// Active protocol version.
    pub fn version(&self) -> ProtocolVersion {
        self.session.codec.version()
    }

    /// Startup context.
    pub fn context(&self) -> &ClientContext {
        &self.session.context
    }

    /// Snapshot of server-announced facts.
    pub fn game_info(&self) -> GameInfo {
        self.session.game().clone()
    }

    /// Whether the tick loop is running.
    pub fn is_ticking(&self) -> bool {
        self.session
            .tick
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(TickScheduler::is_running)
            .unwrap_or(false)
    }

    /// Block storage, while in play.
    pub fn world(&self) -> Option<Arc<SharedWorld>> {
        self.session.managers().as_ref().map(|m| Arc::clone(&m.world))
    }

    /// Player owner, while in play.
    pub fn entities(&self) -> Option<Arc<EntityManager>> {
        self.session.managers().as_ref().map(|m| Arc::clone(&m.entities))
    }

    /// Shared player state, while in play.
    pub fn player(&self) -> Option<Arc<Mutex<PlayerState>>> {
        self.entities().map(|entities| entities.player())
    }

    /// Open windows, while in play.
    pub fn inventory(&self) -> Option<Arc<InventoryManager>> {
        self.session.managers().as_ref().map(|m| Arc::clone(&m.inventory))
    }

    /// Click tracker, while in play.
    pub fn transactions(&self) -> Option<Arc<TransactionTracker>> {
        self.session
            .managers()
            .as_ref()
            .map(|m| Arc::clone(&m.transactions))
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.session.disconnect("client dropped");
        self.session.registry.unregister_all();
    }
}

/// Kinds the client sends without being asked to.
fn required_kinds(version: ProtocolVersion) -> Vec<MessageKind> {
    let mut kinds = vec![
        MessageKind::Handshake,
        MessageKind::LoginStart,
        MessageKind::KeepAliveServerbound,
        MessageKind::TeleportConfirm,
        MessageKind::PlayerPositionRotation,
        MessageKind::ContainerClick,
        MessageKind::CloseWindowServerbound,
        MessageKind::ClientStatus,
        MessageKind::ClientSettings,
    ];
    if version.has_transaction_acks() {
        kinds.push(MessageKind::ConfirmTransactionServerbound);
    } else {
        kinds.push(MessageKind::Pong);
    }
    kinds
}

impl Session {
    fn game(&self) -> MutexGuard<'_, GameInfo> {
        self.game.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn managers(&self) -> RwLockReadGuard<'_, Option<Managers>> {
        self.managers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn handshake(&self, next_state: i32) -> Message {
        let config = &self.context.config;
        Message::Handshake(Handshake {
            protocol_version: self.codec.version().number() as i32,
            server_address: config.server_address.clone(),
            server_port: config.server_port,
            next_state,
        })
    }

    fn open(&self, transport: Arc<dyn Transport>) -> Result<()> {
        self.state.connect()?;
        self.splitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.game() = GameInfo::default();
        self.outbox.attach(transport);
        Ok(())
    }

    fn send(&self, message: &Message) -> Result<()> {
        self.outbox.send(message)
    }

    /// Send from a handler; failures are logged, not propagated.
    fn reply(&self, message: Message) {
        if let Err(err) = self.send(&message) {
            warn!(kind = ?message.kind(), error = %err, "reply not sent");
        }
    }

    fn receive(&self, bytes: &[u8]) -> Result<usize> {
        if !self.outbox.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let mut splitter = self.splitter.lock().unwrap_or_else(PoisonError::into_inner);
        splitter.push(bytes);
        let mut handled = 0;
        loop {
            let frame = match splitter.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => return Err(self.fail(err.into())),
            };
            if let Err(err) = self.handle_frame(&frame) {
                return Err(self.fail(err));
            }
            handled += 1;
            if self.state.state() == ConnectionState::Disconnected {
                splitter.clear();
                break;
            }
        }
        Ok(handled)
    }

    fn handle_frame(&self, frame: &[u8]) -> Result<()> {
        let state = self.state.state();
        let message = self.codec.decode(Direction::Clientbound, state, frame)?;
        self.state.check_incoming(message.kind())?;
        self.state.on_received(&message);
        self.registry.dispatch(&message)?;
        Ok(())
    }

    fn fail(&self, err: ClientError) -> ClientError {
        match &err {
            ClientError::Protocol(protocol) if protocol.is_desync() => {
                warn!(error = %err, "protocol desync")
            }
            _ => warn!(error = %err, "fatal receive error"),
        }
        self.disconnect(&err.to_string());
        err
    }

    fn enter_play(self: &Arc<Self>, profile: &LoginSuccess) {
        let config = &self.context.config;
        let world = Arc::new(SharedWorld::new(Arc::clone(&self.context.shapes)));
        let entities = Arc::new(EntityManager::new());
        let inventory = Arc::new(InventoryManager::new());
        let transactions = Arc::new(TransactionTracker::new(
            Arc::clone(&inventory),
            Arc::clone(&self.outbox),
        ));

        let mut subscribers = Vec::new();
        if !config.afk_only {
            subscribers.push(self.registry.register(world.clone(), SharedWorld::SUBSCRIPTIONS));
            subscribers.push(
                self.registry
                    .register(entities.clone(), EntityManager::SUBSCRIPTIONS),
            );
            subscribers.push(
                self.registry
                    .register(inventory.clone(), InventoryManager::SUBSCRIPTIONS),
            );
        }
        subscribers.push(
            self.registry
                .register(transactions.clone(), TransactionTracker::SUBSCRIPTIONS),
        );

        let shared = TickShared {
            state: Arc::clone(&self.state),
            outbox: Arc::clone(&self.outbox),
            player: entities.player(),
            world: world.clone(),
            transactions: Some(Arc::clone(&transactions)),
            transaction_timeout: config.transaction_timeout(),
            on_send_error: {
                let session = Arc::downgrade(self);
                Box::new(move |err: &ClientError| {
                    if let Some(session) = session.upgrade() {
                        session.disconnect(&format!("position send failed: {err}"));
                    }
                })
            },
        };

        *self.managers.write().unwrap_or_else(PoisonError::into_inner) = Some(Managers {
            world,
            entities,
            inventory,
            transactions,
            subscribers,
        });
        self.game().profile = Some(profile.clone());
        info!(username = %profile.username, uuid = %profile.uuid, "logged in");

        let settings = TickSettings {
            period: config.tick_period(),
            position_keepalive: config.position_keepalive(),
            grace: config.sync_grace(),
            afk_only: config.afk_only,
        };
        match TickScheduler::start(settings, shared) {
            Ok(tick) => {
                let previous = self
                    .tick
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(tick);
                if let Some(mut previous) = previous {
                    previous.stop();
                }
                // The loop may have failed before it was stored.
                if self.state.state() != ConnectionState::Play {
                    self.disconnect("left play while the tick loop started");
                }
            }
            Err(err) => {
                warn!(error = %err, "tick thread could not start");
                self.disconnect("tick thread could not start");
            }
        }
    }

    fn disconnect(&self, reason: &str) -> bool {
        let left_state = self.state.disconnect();

        // Join the tick thread before the subsystems it reads go away.
        let tick = self.tick.lock().unwrap_or_else(PoisonError::into_inner).take();
        let stopped_tick = tick.is_some();
        if let Some(mut tick) = tick {
            tick.stop();
        }

        let managers = self
            .managers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let dropped_managers = managers.is_some();
        if let Some(managers) = managers {
            for id in managers.subscribers {
                self.registry.unregister(id);
            }
        }

        let had_transport = self.outbox.is_connected();
        self.outbox.detach();

        let acted = left_state || stopped_tick || dropped_managers || had_transport;
        if acted {
            info!(reason, "disconnected");
        }
        acted
    }
}

/// The session's own reactions to server messages.
struct SessionHandler {
    session: Weak<Session>,
}

impl SessionHandler {
    const SUBSCRIPTIONS: &'static [MessageKind] = &[
        MessageKind::StatusResponse,
        MessageKind::StatusPong,
        MessageKind::LoginDisconnect,
        MessageKind::EncryptionRequest,
        MessageKind::LoginSuccess,
        MessageKind::SetCompression,
        MessageKind::KeepAliveClientbound,
        MessageKind::PlayDisconnect,
        MessageKind::PlayerPositionAndLook,
        MessageKind::UpdateHealth,
        MessageKind::ChangeDifficulty,
        MessageKind::PlayerAbilities,
        MessageKind::Ping,
    ];

    fn with_session(&self, f: impl FnOnce(&Arc<Session>)) {
        if let Some(session) = self.session.upgrade() {
            f(&session);
        }
    }
}

impl MessageHandler for SessionHandler {
    fn on_status_response(&self, msg: &StatusResponse) {
        self.with_session(|session| {
            session.game().status_json = Some(msg.json.clone());
            let payload = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as i64)
                .unwrap_or_default();
            *session
                .status_ping_sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
            session.reply(Message::StatusPing(StatusPing { payload }));
        });
    }

    fn on_status_pong(&self, _msg: &StatusPong) {
        self.with_session(|session| {
            let sent = session
                .status_ping_sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(sent) = sent {
                session.game().status_latency = Some(sent.elapsed());
            }
            session.disconnect("status query complete");
        });
    }

    fn on_login_disconnect(&self, msg: &LoginDisconnect) {
        self.with_session(|session| {
            session.disconnect(&format!("kicked during login: {}", msg.reason));
        });
    }

    fn on_encryption_request(&self, msg: &EncryptionRequest) {
        self.with_session(|session| {
            warn!(server_id = %msg.server_id, "server requires online mode");
            session.disconnect("online mode is not supported");
        });
    }

    fn on_login_success(&self, msg: &LoginSuccess) {
        self.with_session(|session| session.enter_play(msg));
    }

    fn on_set_compression(&self, msg: &SetCompression) {
        self.with_session(|session| {
            debug!(threshold = msg.threshold, "compression enabled");
            session.outbox.set_compression(msg.threshold);
        });
    }

    fn on_keep_alive_clientbound(&self, msg: &KeepAliveClientbound) {
        self.with_session(|session| {
            session.reply(Message::KeepAliveServerbound(KeepAliveServerbound { id: msg.id }));
        });
    }

    fn on_play_disconnect(&self, msg: &PlayDisconnect) {
        self.with_session(|session| {
            session.disconnect(&format!("kicked: {}", msg.reason));
        });
    }

    fn on_player_position_and_look(&self, msg: &PlayerPositionAndLook) {
        self.with_session(|session| {
            session.reply(Message::TeleportConfirm(TeleportConfirm {
                teleport_id: msg.teleport_id,
            }));
        });
    }

    fn on_update_health(&self, msg: &UpdateHealth) {
        self.with_session(|session| {
            if msg.health <= 0.0 && session.context.config.auto_respawn {
                info!("player died, respawning");
                session.reply(Message::ClientStatus(ClientStatus {
                    action: CLIENT_STATUS_RESPAWN,
                }));
            }
        });
    }

    fn on_change_difficulty(&self, msg: &ChangeDifficulty) {
        self.with_session(|session| {
            session.game().difficulty = Some(msg.clone());
        });
    }

    fn on_player_abilities(&self, msg: &PlayerAbilities) {
        self.with_session(|session| {
            session.game().abilities = Some(msg.clone());
            let config = &session.context.config;
            session.reply(Message::ClientSettings(ClientSettings::for_version(
                session.codec.version(),
                &config.locale,
                config.view_distance,
            )));
        });
    }

    fn on_ping(&self, msg: &Ping) {
        self.with_session(|session| {
            session.reply(Message::Pong(Pong { id: msg.id }));
        });
    }
}
