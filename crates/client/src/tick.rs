//! Fixed-rate physics and position sync.

use crate::error::ClientError;
use crate::outbox::Outbox;
use crate::transaction::TransactionTracker;
use craftbot_physics::{PhysicsEngine, PlayerState, WorldView};
use craftbot_protocol::{
    ConnectionState, ConnectionStateMachine, Message, PlayerPositionRotation,
};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Timing knobs of the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSettings {
    /// Length of one tick.
    pub period: Duration,
    /// Longest gap between two position messages.
    pub position_keepalive: Duration,
    /// Delay before the first tick.
    pub grace: Duration,
    /// Skip physics entirely.
    pub afk_only: bool,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(50),
            position_keepalive: Duration::from_millis(1000),
            grace: Duration::from_millis(500),
            afk_only: false,
        }
    }
}

/// Per-tick decision: step physics, then decide whether to report the position.
#[derive(Debug)]
pub struct PositionSync {
    engine: PhysicsEngine,
    settings: TickSettings,
    last_send: Instant,
}

impl PositionSync {
    /// Start counting the keep-alive interval from `now`.
    pub fn new(settings: TickSettings, now: Instant) -> Self {
        Self {
            engine: PhysicsEngine::new(),
            settings,
            last_send: now,
        }
    }

    /// Run one tick at `now`.
    ///
    /// Returns the position message when the player moved or when nothing was
    /// sent for a keep-alive interval.
    pub fn step(
        &mut self,
        now: Instant,
        player: &mut PlayerState,
        world: &dyn WorldView,
    ) -> Option<Message> {
        let moved = if self.settings.afk_only {
            false
        } else {
            self.engine.tick(player, world).moved
        };

        let idle = now.saturating_duration_since(self.last_send);
        if !moved && idle < self.settings.position_keepalive {
            return None;
        }
        self.last_send = now;
        Some(Message::PlayerPositionRotation(PlayerPositionRotation {
            x: player.position.x,
            feet_y: player.position.y,
            z: player.position.z,
            yaw: player.yaw,
            pitch: player.pitch,
            on_ground: player.on_ground,
        }))
    }
}

/// Handles the tick thread works on.
pub struct TickShared {
    /// Connection phase; the loop runs while it is `Play`.
    pub state: Arc<ConnectionStateMachine>,
    /// Where position messages go.
    pub outbox: Arc<Outbox>,
    /// The local player.
    pub player: Arc<Mutex<PlayerState>>,
    /// Block data for collisions.
    pub world: Arc<dyn WorldView>,
    /// Tracker swept for stale clicks when `transaction_timeout` is set.
    pub transactions: Option<Arc<TransactionTracker>>,
    /// Maximum age of a pending click.
    pub transaction_timeout: Option<Duration>,
    /// Called from the tick thread when a send fails.
    pub on_send_error: Box<dyn Fn(&ClientError) + Send>,
}

/// Owns the tick thread.
#[derive(Debug)]
pub struct TickScheduler {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl TickScheduler {
    /// Spawn the tick thread.
    pub fn start(settings: TickSettings, shared: TickShared) -> std::io::Result<Self> {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("craftbot-tick".into())
            .spawn(move || run(settings, shared, stop_rx))?;
        let thread_id = handle.thread().id();
        info!(period_ms = settings.period.as_millis() as u64, "tick loop started");
        Ok(Self {
            stop,
            handle: Some(handle),
            thread_id,
        })
    }

    /// Whether the thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Wake the thread and wait for it to exit.
    ///
    /// Called from the tick thread itself, this only signals.
    pub fn stop(&mut self) {
        // Ignore the error: the receiver is gone once the loop has ended.
        let _ = self.stop.send(());
        let Some(handle) = self.handle.take() else {
            return;
        };
        if thread::current().id() == self.thread_id {
            return;
        }
        if handle.join().is_err() {
            warn!("tick thread panicked");
        }
        debug!("tick loop joined");
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sleep until `deadline` unless a stop request arrives. Returns false on stop.
fn wait_until(stop: &mpsc::Receiver<()>, deadline: Instant) -> bool {
    let timeout = deadline.saturating_duration_since(Instant::now());
    matches!(stop.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
}

fn run(settings: TickSettings, shared: TickShared, stop: mpsc::Receiver<()>) {
    if !wait_until(&stop, Instant::now() + settings.grace) {
        debug!("tick loop stopped during grace delay");
        return;
    }

    let mut sync = PositionSync::new(settings, Instant::now());
    let mut ticks: u64 = 0;
    while shared.state.state() == ConnectionState::Play {
        let deadline = Instant::now() + settings.period;

        let message = {
            let mut player = shared.player.lock().unwrap_or_else(PoisonError::into_inner);
            sync.step(Instant::now(), &mut player, shared.world.as_ref())
        };

        if let Some(message) = message {
            trace!(tick = ticks, "sending position");
            if let Err(err) = shared.outbox.send(&message) {
                if shared.state.state() == ConnectionState::Play {
                    warn!(error = %err, "position send failed, leaving tick loop");
                    (shared.on_send_error)(&err);
                }
                break;
            }
        }

        if let (Some(tracker), Some(timeout)) = (&shared.transactions, shared.transaction_timeout) {
            tracker.expire_older_than(timeout);
        }

        ticks += 1;
        if !wait_until(&stop, deadline) {
            break;
        }
    }
    info!(ticks, "tick loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftbot_physics::BlockShapes;
    use glam::{DVec3, IVec3};

    struct Empty;

    impl WorldView for Empty {
        fn block_shapes_at(&self, _pos: IVec3) -> Option<BlockShapes> {
            None
        }
    }

    #[test]
    fn moving_player_reports_every_tick() {
        let start = Instant::now();
        let mut sync = PositionSync::new(TickSettings::default(), start);
        let mut player = PlayerState::default();
        player.teleport(DVec3::new(0.0, 100.0, 0.0), 0.0, 0.0);
        for tick in 1..=5u32 {
            let now = start + Duration::from_millis(50) * tick;
            assert!(sync.step(now, &mut player, &Empty).is_some());
        }
        assert!(player.position.y < 100.0);
    }

    #[test]
    fn afk_only_skips_physics() {
        let settings = TickSettings {
            afk_only: true,
            ..TickSettings::default()
        };
        let start = Instant::now();
        let mut sync = PositionSync::new(settings, start);
        let mut player = PlayerState::at(DVec3::new(0.0, 100.0, 0.0));
        assert!(sync
            .step(start + Duration::from_millis(50), &mut player, &Empty)
            .is_none());
        assert_eq!(player.position.y, 100.0);
        assert!(sync
            .step(start + Duration::from_millis(1000), &mut player, &Empty)
            .is_some());
    }
}
