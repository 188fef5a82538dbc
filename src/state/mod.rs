//! Shared runtime state: the storage handle, per-room event channels, and the
//! degraded-mode flag.

pub mod events;
pub mod room;
pub mod round;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::game_store::GameStore,
    error::ServiceError,
    state::events::{RoomChannel, RoomChannels},
};

pub use self::events::EventHub;
pub use self::room::RoomSession;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Broadcast buffer size of each room's event channel.
const ROOM_EVENT_CAPACITY: usize = 16;

/// Central application state storing the storage handle and live room channels.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    rooms: RoomChannels,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            rooms: RoomChannels::new(ROOM_EVENT_CAPACITY),
            degraded: degraded_tx,
            config,
        })
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current game store or fail when running degraded.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn install_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Event channel of `room_id`, created on first use.
    pub fn room_channel(&self, room_id: Uuid) -> Arc<RoomChannel> {
        self.rooms.channel(room_id)
    }

    /// Drop a torn-down room's event channel.
    pub fn drop_room_channel(&self, room_id: Uuid) {
        self.rooms.remove(room_id);
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
