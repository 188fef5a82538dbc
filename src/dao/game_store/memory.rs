//! In-memory [`GameStore`] used by tests and storage-less local runs.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{RoomEntity, RoomListItemEntity},
    storage::{StorageError, StorageResult},
};

/// `DashMap`-backed store enforcing the same version discipline as the real
/// backends.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    rooms: Arc<DashMap<Uuid, RoomEntity>>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn save_room(
        &self,
        room: RoomEntity,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            // Entry holds the shard lock, making the check-then-write atomic.
            use dashmap::mapref::entry::Entry;

            match rooms.entry(room.id) {
                Entry::Occupied(mut occupied) => {
                    let stored = occupied.get();
                    match expected_version {
                        Some(expected) if stored.version == expected => {
                            occupied.insert(room);
                            Ok(())
                        }
                        _ => Err(StorageError::conflict(stored.code.clone())),
                    }
                }
                Entry::Vacant(vacant) => {
                    if expected_version.is_some() {
                        return Err(StorageError::conflict(room.code.clone()));
                    }
                    vacant.insert(room);
                    Ok(())
                }
            }
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move { Ok(rooms.get(&id).map(|entry| entry.clone())) })
    }

    fn find_room_by_code(
        &self,
        code: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        let code = code.to_string();
        Box::pin(async move {
            Ok(rooms
                .iter()
                .find(|entry| entry.code == code)
                .map(|entry| entry.clone()))
        })
    }

    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let rooms = self.rooms.clone();
        Box::pin(async move { Ok(rooms.remove(&id).is_some()) })
    }

    fn list_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<RoomListItemEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            Ok(rooms
                .iter()
                .map(|entry| RoomListItemEntity::from(entry.value()))
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::RoomStatus;

    fn room(version: u64) -> RoomEntity {
        RoomEntity {
            id: Uuid::nil(),
            code: "ABCDEF".into(),
            status: RoomStatus::Lobby,
            host_id: Uuid::new_v4(),
            players: Vec::new(),
            round: None,
            version,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn create_requires_absence() {
        let store = MemoryGameStore::new();
        store.save_room(room(0), None).await.unwrap();

        let err = store.save_room(room(0), None).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryGameStore::new();
        store.save_room(room(0), None).await.unwrap();
        store.save_room(room(1), Some(0)).await.unwrap();

        // A second writer that also read version 0 must lose.
        let err = store.save_room(room(1), Some(0)).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));

        let stored = store.find_room(Uuid::nil()).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn lookup_by_code() {
        let store = MemoryGameStore::new();
        store.save_room(room(0), None).await.unwrap();

        assert!(
            store
                .find_room_by_code("ABCDEF")
                .await
                .unwrap()
                .is_some()
        );
        assert!(store.find_room_by_code("ZZZZZZ").await.unwrap().is_none());
    }
}
