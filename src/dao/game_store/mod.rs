pub mod couchdb;
pub mod memory;

use crate::dao::models::{RoomEntity, RoomListItemEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for room records.
///
/// `save_room` is a compare-and-swap: the write only lands when the stored
/// version still equals `expected_version` (`None` means the room must not
/// exist yet). A mismatch yields [`StorageError::Conflict`] and leaves the
/// stored record untouched, so two actors racing to resolve the same clue
/// cannot both apply their effects.
///
/// [`StorageError::Conflict`]: crate::dao::storage::StorageError::Conflict
pub trait GameStore: Send + Sync {
    /// Persist `room` if the stored version matches `expected_version`.
    fn save_room(
        &self,
        room: RoomEntity,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a room by primary key.
    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Fetch a room by its join code.
    fn find_room_by_code(&self, code: &str)
    -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Delete a room and everything it carries. Returns whether it existed.
    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// List all known rooms.
    fn list_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<RoomListItemEntity>>>;
    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
