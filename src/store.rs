//! Saved-route persistence
//!
//! Each user owns one collection of saved routes stored under
//! `artifacts/{app_id}/users/{uid}/moto_routes`. Every change is broadcast to
//! watchers so a UI can keep its list live.

use std::path::Path;

use anyhow::anyhow;
use async_trait::async_trait;
use fjall::Keyspace;
use tokio::sync::{Mutex, watch};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::Result;
use crate::error::MotoPlanError;
use crate::models::{NewSavedRoute, SavedRoute};

/// The user a collection belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    /// Generated locally rather than configured
    pub anonymous: bool,
}

/// Storage for a single user's saved routes
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Owner of the collection
    fn identity(&self) -> &Identity;

    /// Store a new trip, returning the created record
    async fn save(&self, route: NewSavedRoute) -> Result<SavedRoute>;

    /// All saved routes, oldest first
    async fn list(&self) -> Result<Vec<SavedRoute>>;

    /// Remove one saved route
    async fn delete(&self, id: &str) -> Result<()>;

    /// Receiver that observes the collection after every change
    fn watch(&self) -> watch::Receiver<Vec<SavedRoute>>;
}

/// A live listener created by [`subscribe`]; dropping it unsubscribes
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Call `callback` with the current collection now and after every change.
///
/// Must be called from within a tokio runtime.
pub fn subscribe<F>(store: &dyn RouteStore, mut callback: F) -> Subscription
where
    F: FnMut(&[SavedRoute]) + Send + 'static,
{
    let mut changes = store.watch();
    let handle = tokio::spawn(async move {
        loop {
            {
                let routes = changes.borrow_and_update();
                callback(&routes);
            }
            if changes.changed().await.is_err() {
                debug!("Route store closed, ending subscription");
                break;
            }
        }
    });
    Subscription { handle }
}

/// Saved routes in an embedded fjall keyspace
pub struct FjallRouteStore {
    store: Keyspace,
    collection: String,
    identity: Identity,
    changes: watch::Sender<Vec<SavedRoute>>,
    /// Serializes read-modify-write cycles on the collection
    write_lock: Mutex<()>,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn collection_key(app_id: &str, uid: &str) -> String {
    format!("artifacts/{app_id}/users/{uid}/moto_routes")
}

fn anonymous_uid_key(app_id: &str) -> Vec<u8> {
    format!("artifacts/{app_id}/anonymous_uid").into_bytes()
}

fn decode_routes(bytes: Option<Vec<u8>>) -> anyhow::Result<Vec<SavedRoute>> {
    match bytes {
        Some(bytes) => Ok(postcard::from_bytes(&bytes)?),
        None => Ok(Vec::new()),
    }
}

/// Use the configured user id, or the anonymous id stored on a previous run,
/// or generate and remember a new anonymous id.
fn resolve_identity(
    store: &Keyspace,
    app_id: &str,
    user_id: Option<String>,
) -> anyhow::Result<Identity> {
    if let Some(uid) = user_id.filter(|uid| !uid.trim().is_empty()) {
        return Ok(Identity {
            uid,
            anonymous: false,
        });
    }

    let key = anonymous_uid_key(app_id);
    if let Some(bytes) = get_from_store(store.clone(), key.clone())? {
        let uid = String::from_utf8(bytes).map_err(|_| anyhow!("Stored user id is not UTF-8"))?;
        return Ok(Identity {
            uid,
            anonymous: true,
        });
    }

    let uid = Uuid::new_v4().simple().to_string();
    store.insert(key, uid.as_bytes().to_vec())?;
    info!("Signed in anonymously as {}", uid);
    Ok(Identity {
        uid,
        anonymous: true,
    })
}

impl FjallRouteStore {
    /// Open (or create) the store at `path` and establish the user identity
    pub fn open(path: impl AsRef<Path>, app_id: &str, user_id: Option<String>) -> Result<Self> {
        Self::open_inner(path.as_ref(), app_id, user_id)
            .map_err(|e| MotoPlanError::store(format!("Failed to open route store: {e:#}")))
    }

    fn open_inner(path: &Path, app_id: &str, user_id: Option<String>) -> anyhow::Result<Self> {
        let db = fjall::Database::builder(path).open()?;
        let store = db.keyspace("saved_routes", fjall::KeyspaceCreateOptions::default)?;

        let identity = resolve_identity(&store, app_id, user_id)?;
        let collection = collection_key(app_id, &identity.uid);
        let existing = decode_routes(get_from_store(
            store.clone(),
            collection.clone().into_bytes(),
        )?)?;
        debug!(
            "Opened route store at {} with {} saved routes",
            path.display(),
            existing.len()
        );

        let (changes, _) = watch::channel(existing);
        Ok(Self {
            store,
            collection,
            identity,
            changes,
            write_lock: Mutex::new(()),
        })
    }

    async fn load(&self) -> anyhow::Result<Vec<SavedRoute>> {
        let store = self.store.clone();
        let key = self.collection.clone().into_bytes();
        let bytes = task::spawn_blocking(move || get_from_store(store, key)).await??;
        decode_routes(bytes)
    }

    async fn persist(&self, routes: &[SavedRoute]) -> anyhow::Result<()> {
        let bytes = postcard::to_stdvec(routes)?;
        let store = self.store.clone();
        let key = self.collection.clone().into_bytes();
        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Apply `change` to the collection, persist it and notify watchers
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut Vec<SavedRoute>) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.write_lock.lock().await;

        let mut routes = self.load().await.map_err(storage_error)?;
        let outcome = change(&mut routes)?;
        routes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        self.persist(&routes).await.map_err(storage_error)?;

        self.changes.send_replace(routes);
        Ok(outcome)
    }
}

fn storage_error(err: anyhow::Error) -> MotoPlanError {
    MotoPlanError::store(format!("{err:#}"))
}

#[async_trait]
impl RouteStore for FjallRouteStore {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    #[instrument(name = "save_route", level = "debug", skip(self))]
    async fn save(&self, route: NewSavedRoute) -> Result<SavedRoute> {
        let saved = SavedRoute::create(route);
        let record = saved.clone();
        self.update(move |routes| {
            routes.push(record);
            Ok(())
        })
        .await?;

        info!("Saved route {} as {}", saved, saved.id);
        Ok(saved)
    }

    #[instrument(name = "list_routes", level = "debug", skip(self))]
    async fn list(&self) -> Result<Vec<SavedRoute>> {
        let mut routes = self.load().await.map_err(storage_error)?;
        routes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(routes)
    }

    #[instrument(name = "delete_route", level = "debug", skip(self))]
    async fn delete(&self, id: &str) -> Result<()> {
        self.update(|routes| {
            let before = routes.len();
            routes.retain(|route| route.id != id);
            if routes.len() == before {
                return Err(MotoPlanError::UnknownRoute { id: id.to_string() });
            }
            Ok(())
        })
        .await?;

        info!("Deleted saved route {}", id);
        Ok(())
    }

    fn watch(&self) -> watch::Receiver<Vec<SavedRoute>> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_key_is_scoped_per_user() {
        assert_eq!(
            collection_key("moto-local-dev", "abc"),
            "artifacts/moto-local-dev/users/abc/moto_routes"
        );
        assert_ne!(collection_key("app", "alice"), collection_key("app", "bob"));
    }

    #[test]
    fn test_decode_missing_collection() {
        assert!(decode_routes(None).unwrap().is_empty());
    }
}
