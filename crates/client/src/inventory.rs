//! Open container windows and their transaction counters.

use craftbot_protocol::{
    CloseWindowClientbound, MessageHandler, MessageKind, OpenWindow, WindowType,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Id of the player's own inventory, always open.
pub const PLAYER_WINDOW: u8 = 0;

/// One open window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    /// Window id.
    pub id: u8,
    /// Chat JSON title; empty for the player inventory.
    pub title: String,
    /// Type as announced by the server; `None` for the player inventory.
    pub window_type: Option<WindowType>,
    /// Transaction id the next click on this window gets.
    pub next_transaction_id: i16,
}

impl Window {
    fn new(id: u8, title: String, window_type: Option<WindowType>) -> Self {
        Self {
            id,
            title,
            window_type,
            next_transaction_id: 0,
        }
    }
}

/// Tracks which windows are open.
#[derive(Debug)]
pub struct InventoryManager {
    windows: Mutex<BTreeMap<u8, Window>>,
}

impl Default for InventoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryManager {
    /// Kinds this manager listens to.
    pub const SUBSCRIPTIONS: &'static [MessageKind] = &[
        MessageKind::OpenWindow,
        MessageKind::CloseWindowClientbound,
    ];

    /// Only the player inventory is open.
    pub fn new() -> Self {
        let mut windows = BTreeMap::new();
        windows.insert(PLAYER_WINDOW, Window::new(PLAYER_WINDOW, String::new(), None));
        Self {
            windows: Mutex::new(windows),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u8, Window>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of window `id`, if open.
    pub fn window(&self, id: u8) -> Option<Window> {
        self.lock().get(&id).cloned()
    }

    /// Ids of all open windows.
    pub fn open_windows(&self) -> Vec<u8> {
        self.lock().keys().copied().collect()
    }

    /// Open (or reopen) a window with a fresh counter.
    pub fn open_window(&self, id: u8, title: impl Into<String>, window_type: Option<WindowType>) {
        let window = Window::new(id, title.into(), window_type);
        debug!(window = id, title = %window.title, "window opened");
        self.lock().insert(id, window);
    }

    /// Close a window. The player inventory never closes.
    pub fn close_window(&self, id: u8) -> bool {
        if id == PLAYER_WINDOW {
            return false;
        }
        let closed = self.lock().remove(&id).is_some();
        if closed {
            debug!(window = id, "window closed");
        }
        closed
    }

    /// Take the next transaction id of window `id` and advance its counter.
    ///
    /// The counter wraps back to zero after `i16::MAX`.
    pub fn reserve_transaction_id(&self, id: u8) -> Option<i16> {
        self.reserve_transaction_id_if(id, |_| true)
            .map(|reserved| reserved.unwrap_or_else(|refused| refused))
    }

    /// Take the next transaction id of window `id` only if `is_free` accepts it.
    ///
    /// `None` when the window is not open. A refused id comes back as `Err`
    /// and the counter stays where it was.
    pub fn reserve_transaction_id_if(
        &self,
        id: u8,
        is_free: impl FnOnce(i16) -> bool,
    ) -> Option<Result<i16, i16>> {
        let mut windows = self.lock();
        let window = windows.get_mut(&id)?;
        let candidate = window.next_transaction_id;
        if !is_free(candidate) {
            return Some(Err(candidate));
        }
        window.next_transaction_id = candidate.checked_add(1).unwrap_or(0);
        Some(Ok(candidate))
    }
}

impl MessageHandler for InventoryManager {
    fn on_open_window(&self, msg: &OpenWindow) {
        match u8::try_from(msg.window_id) {
            Ok(id) => self.open_window(id, msg.title.clone(), Some(msg.window_type.clone())),
            Err(_) => warn!(window = msg.window_id, "window id out of range, ignored"),
        }
    }

    fn on_close_window_clientbound(&self, msg: &CloseWindowClientbound) {
        self.close_window(msg.window_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_inventory_is_always_open() {
        let inventory = InventoryManager::new();
        assert!(inventory.window(PLAYER_WINDOW).is_some());
        assert!(!inventory.close_window(PLAYER_WINDOW));
        assert_eq!(inventory.open_windows(), vec![PLAYER_WINDOW]);
    }

    #[test]
    fn counter_advances_and_wraps() {
        let inventory = InventoryManager::new();
        inventory.open_window(3, "Chest", None);
        assert_eq!(inventory.reserve_transaction_id(3), Some(0));
        assert_eq!(inventory.reserve_transaction_id(3), Some(1));
        assert_eq!(inventory.window(3).unwrap().next_transaction_id, 2);

        inventory.lock().get_mut(&3).unwrap().next_transaction_id = i16::MAX;
        assert_eq!(inventory.reserve_transaction_id(3), Some(i16::MAX));
        assert_eq!(inventory.reserve_transaction_id(3), Some(0));
        assert_eq!(inventory.reserve_transaction_id(9), None);
    }

    #[test]
    fn refused_id_is_not_consumed() {
        let inventory = InventoryManager::new();
        assert_eq!(inventory.reserve_transaction_id_if(PLAYER_WINDOW, |id| id != 0), Some(Err(0)));
        assert_eq!(inventory.window(PLAYER_WINDOW).unwrap().next_transaction_id, 0);
        assert_eq!(inventory.reserve_transaction_id_if(PLAYER_WINDOW, |_| true), Some(Ok(0)));
        assert_eq!(inventory.reserve_transaction_id_if(4, |_| true), None);
    }

    #[test]
    fn server_messages_open_and_close_windows() {
        let inventory = InventoryManager::new();
        inventory.on_open_window(&OpenWindow {
            window_id: 5,
            window_type: WindowType::Registry { id: 2 },
            title: "{\"text\":\"Chest\"}".into(),
        });
        assert_eq!(
            inventory.window(5).unwrap().window_type,
            Some(WindowType::Registry { id: 2 })
        );

        inventory.on_open_window(&OpenWindow {
            window_id: 300,
            window_type: WindowType::Registry { id: 2 },
            title: String::new(),
        });
        assert_eq!(inventory.open_windows(), vec![0, 5]);

        inventory.on_close_window_clientbound(&CloseWindowClientbound { window_id: 5 });
        assert!(inventory.window(5).is_none());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn reserved_ids_follow_the_counter(start in 0i16..=i16::MAX, count in 1usize..64) {
                let inventory = InventoryManager::new();
                inventory.open_window(7, "", None);
                inventory.lock().get_mut(&7).unwrap().next_transaction_id = start;

                let mut expected = start;
                for _ in 0..count {
                    prop_assert_eq!(inventory.reserve_transaction_id(7), Some(expected));
                    expected = expected.checked_add(1).unwrap_or(0);
                }
                prop_assert_eq!(inventory.window(7).unwrap().next_transaction_id, expected);
                prop_assert_eq!(inventory.window(PLAYER_WINDOW).unwrap().next_transaction_id, 0);
            }
        }
    }
}
