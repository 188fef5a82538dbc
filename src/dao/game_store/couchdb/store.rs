use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{RoomEntity, RoomListItemEntity},
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchRoomDocument, END_SUFFIX, ROOM_PREFIX, room_doc_id},
};

/// CouchDB-backed room store.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            database: Arc::from(config.database),
            auth: config
                .credentials
                .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass))),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn document_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authed(self.client.request(method, url))
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> CouchResult<Response> {
        builder
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: path.to_string(),
                source,
            })
    }

    /// Check the database exists, creating it on first run.
    async fn ensure_database(&self) -> CouchResult<()> {
        let url = self.database_url();
        let probe = self.send(self.authed(self.client.get(&url)), &url).await?;
        if probe.status().is_success() {
            return Ok(());
        }
        if probe.status() != StatusCode::NOT_FOUND {
            return Err(CouchDaoError::DatabaseStatus {
                database: self.database.to_string(),
                status: probe.status(),
            });
        }

        let created = self.send(self.authed(self.client.put(&url)), &url).await?;
        // 412 means another instance created it between the probe and the put.
        if created.status().is_success() || created.status() == StatusCode::PRECONDITION_FAILED {
            Ok(())
        } else {
            Err(CouchDaoError::DatabaseStatus {
                database: self.database.to_string(),
                status: created.status(),
            })
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(self.document_request(Method::GET, doc_id), doc_id)
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let doc = response.json::<T>().await.map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })?;
                Ok(Some(doc))
            }
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    /// Write a document, distinguishing a CouchDB 409 (stale `_rev`, i.e. a
    /// lost compare-and-swap race) from other failures.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let request = self.document_request(Method::PUT, doc_id).json(document);
        let response = self.send(request, doc_id).await?;

        match response.status() {
            status if status.is_success() => Ok(PutOutcome::Stored),
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    async fn room_documents(&self) -> CouchResult<Vec<CouchRoomDocument>> {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{ROOM_PREFIX}\"")),
            ("endkey", format!("\"{ROOM_PREFIX}{END_SUFFIX}\"")),
        ];

        let request = self.document_request(Method::GET, ALL_DOCS).query(&query);
        let response = self.send(request, ALL_DOCS).await?;
        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })
            })
            .collect()
    }
}

/// Result of a document write.
enum PutOutcome {
    Stored,
    Conflict,
}

/// Decide which `_rev` a write may carry. A matching stored version hands
/// back its revision, a create needs no prior document, anything else is a
/// lost compare-and-swap.
fn cas_rev(
    existing: Option<&CouchRoomDocument>,
    expected_version: Option<u64>,
    code: &str,
) -> StorageResult<Option<String>> {
    match (existing, expected_version) {
        (Some(doc), Some(expected)) if doc.room.version == expected => Ok(doc.rev.clone()),
        (None, None) => Ok(None),
        // Existing record for a create, missing record for an update,
        // or a version that moved on since the read.
        _ => Err(StorageError::conflict(code)),
    }
}

impl GameStore for CouchGameStore {
    fn save_room(
        &self,
        room: RoomEntity,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = room_doc_id(room.id);
            let code = room.code.clone();

            let existing = store.get_document::<CouchRoomDocument>(&doc_id).await?;
            let rev = cas_rev(existing.as_ref(), expected_version, &code)?;

            let doc = CouchRoomDocument::from((room, rev));
            match store.put_document(&doc_id, &doc).await? {
                PutOutcome::Stored => Ok(()),
                PutOutcome::Conflict => Err(StorageError::conflict(code)),
            }
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = room_doc_id(id);
            let maybe_doc = store.get_document::<CouchRoomDocument>(&doc_id).await?;
            maybe_doc
                .map(|doc| RoomEntity::try_from(doc).map_err(Into::into))
                .transpose()
        })
    }

    fn find_room_by_code(
        &self,
        code: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        let code = code.to_string();
        Box::pin(async move {
            let docs = store.room_documents().await?;
            docs.into_iter()
                .find(|doc| doc.room.code == code)
                .map(|doc| RoomEntity::try_from(doc).map_err(Into::into))
                .transpose()
        })
    }

    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = room_doc_id(id);
            let Some(existing) = store.get_document::<CouchRoomDocument>(&doc_id).await? else {
                return Ok(false);
            };
            let Some(rev) = existing.rev else {
                return Ok(false);
            };

            let request = store
                .document_request(Method::DELETE, &doc_id)
                .query(&[("rev", rev)]);
            let response = store.send(request, &doc_id).await?;

            match response.status() {
                status if status.is_success() => Ok(true),
                StatusCode::NOT_FOUND => Ok(false),
                status => Err(CouchDaoError::RequestStatus {
                    path: doc_id,
                    status,
                }
                .into()),
            }
        })
    }

    fn list_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<RoomListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.room_documents().await?;
            docs.into_iter()
                .map(|doc| {
                    RoomEntity::try_from(doc)
                        .map(|entity| RoomListItemEntity::from(&entity))
                        .map_err(Into::into)
                })
                .collect()
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store.send(store.authed(store.client.get(&url)), &url).await?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::RoomStatus;

    fn stored_doc(version: u64, rev: &str) -> CouchRoomDocument {
        let entity = RoomEntity {
            id: Uuid::nil(),
            code: "ABC234".into(),
            status: RoomStatus::Lobby,
            host_id: Uuid::nil(),
            players: Vec::new(),
            round: None,
            version,
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        };
        CouchRoomDocument::from((entity, Some(rev.to_string())))
    }

    #[test]
    fn matching_version_reuses_the_stored_rev() {
        let stored = stored_doc(3, "3-abc");
        assert_eq!(
            cas_rev(Some(&stored), Some(3), "ABC234").unwrap(),
            Some("3-abc".into())
        );
    }

    #[test]
    fn create_requires_no_existing_document() {
        assert_eq!(cas_rev(None, None, "ABC234").unwrap(), None);

        let stored = stored_doc(0, "1-abc");
        assert!(matches!(
            cas_rev(Some(&stored), None, "ABC234"),
            Err(StorageError::Conflict { .. })
        ));
    }

    #[test]
    fn stale_or_missing_versions_are_conflicts() {
        let stored = stored_doc(4, "4-abc");
        assert!(matches!(
            cas_rev(Some(&stored), Some(3), "ABC234"),
            Err(StorageError::Conflict { .. })
        ));
        assert!(matches!(
            cas_rev(None, Some(3), "ABC234"),
            Err(StorageError::Conflict { .. })
        ));
    }
}
