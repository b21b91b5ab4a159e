use std::future::Future;
use std::pin::Pin;

use tokio::sync::Mutex;

use hearth_core::{RegistrySnapshot, WidgetInstance, WidgetTypeManifest};
use serde::{Deserialize, Serialize};

use crate::error::ManagerError;

/// Facade trait for the remote Persistence Service holding widget-type
/// manifests and instance records.
///
/// The real store is a black box behind an HTTP API; tests and offline mode
/// use [`InMemoryPersistence`]. Every failure surfaces as
/// [`ManagerError::Network`] and is caught at the call site — persistence
/// trouble never takes the dashboard down.
pub trait PersistenceService: Send + Sync {
    fn list_manifests<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WidgetTypeManifest>, ManagerError>> + Send + 'a>>;

    fn fetch_manifest<'a>(
        &'a self,
        type_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<WidgetTypeManifest, ManagerError>> + Send + 'a>>;

    fn fetch_registry<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<RegistrySnapshot, ManagerError>> + Send + 'a>>;

    fn fetch_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<WidgetInstance, ManagerError>> + Send + 'a>>;

    fn create_instance<'a>(
        &'a self,
        instance: &'a WidgetInstance,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>>;

    fn replace_registry<'a>(
        &'a self,
        snapshot: &'a RegistrySnapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>>;

    fn delete_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>>;
}

#[derive(Debug, Deserialize)]
struct ManifestList {
    #[serde(rename = "widgetTypes", default)]
    widget_types: Vec<WidgetTypeManifest>,
}

#[derive(Debug, Serialize)]
struct CreateBody<'a> {
    widget: &'a WidgetInstance,
}

/// Persistence client for the dashboard's HTTP API.
pub struct HttpPersistence {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPersistence {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ManagerError> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ManagerError::Network(format!("GET {path} failed: {e}")))?;
        Self::check_status(path, &resp)?;
        resp.json::<T>()
            .await
            .map_err(|e| ManagerError::Network(format!("GET {path}: invalid response: {e}")))
    }

    fn check_status(path: &str, resp: &reqwest::Response) -> Result<(), ManagerError> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ManagerError::Network(format!("{path} returned {status}")))
        }
    }
}

impl PersistenceService for HttpPersistence {
    fn list_manifests<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WidgetTypeManifest>, ManagerError>> + Send + 'a>>
    {
        Box::pin(async move {
            let list: ManifestList = self.get_json("/api/widget-types").await?;
            Ok(list.widget_types)
        })
    }

    fn fetch_manifest<'a>(
        &'a self,
        type_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<WidgetTypeManifest, ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            self.get_json(&format!("/api/widget-types/{type_id}")).await
        })
    }

    fn fetch_registry<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<RegistrySnapshot, ManagerError>> + Send + 'a>> {
        Box::pin(async move { self.get_json("/api/widgets").await })
    }

    fn fetch_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<WidgetInstance, ManagerError>> + Send + 'a>> {
        Box::pin(async move { self.get_json(&format!("/api/widgets/{instance_id}")).await })
    }

    fn create_instance<'a>(
        &'a self,
        instance: &'a WidgetInstance,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            let path = "/api/widgets";
            let resp = self
                .http
                .post(self.url(path))
                .json(&CreateBody { widget: instance })
                .send()
                .await
                .map_err(|e| ManagerError::Network(format!("POST {path} failed: {e}")))?;
            Self::check_status(path, &resp)
        })
    }

    fn replace_registry<'a>(
        &'a self,
        snapshot: &'a RegistrySnapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            let path = "/api/widgets";
            let resp = self
                .http
                .put(self.url(path))
                .json(snapshot)
                .send()
                .await
                .map_err(|e| ManagerError::Network(format!("PUT {path} failed: {e}")))?;
            Self::check_status(path, &resp)
        })
    }

    fn delete_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            let path = format!("/api/widgets/{instance_id}");
            let resp = self
                .http
                .delete(self.url(&path))
                .send()
                .await
                .map_err(|e| ManagerError::Network(format!("DELETE {path} failed: {e}")))?;
            Self::check_status(&path, &resp)
        })
    }
}

#[derive(Default)]
struct InMemoryState {
    manifests: Vec<WidgetTypeManifest>,
    snapshot: RegistrySnapshot,
    deletes: Vec<String>,
    fail_creates: bool,
    fail_deletes: bool,
}

/// In-memory persistence double for tests and `--offline` runs.
///
/// Holds manifests and a registry snapshot behind a mutex, with switches to
/// inject create/delete failures.
#[derive(Default)]
pub struct InMemoryPersistence {
    state: Mutex<InMemoryState>,
}

impl InMemoryPersistence {
    pub fn new(manifests: Vec<WidgetTypeManifest>, snapshot: RegistrySnapshot) -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                manifests,
                snapshot,
                ..InMemoryState::default()
            }),
        }
    }

    /// Make every subsequent `create_instance` fail.
    pub async fn fail_creates(&self, fail: bool) {
        self.state.lock().await.fail_creates = fail;
    }

    /// Make every subsequent `delete_instance` fail.
    pub async fn fail_deletes(&self, fail: bool) {
        self.state.lock().await.fail_deletes = fail;
    }

    /// Ids successfully deleted so far.
    pub async fn deleted_ids(&self) -> Vec<String> {
        self.state.lock().await.deletes.clone()
    }

    /// The store's current registry snapshot.
    pub async fn stored_snapshot(&self) -> RegistrySnapshot {
        self.state.lock().await.snapshot.clone()
    }

    /// Replace the server-side snapshot out of band, simulating changes made
    /// by other clients between loads.
    pub async fn set_snapshot(&self, snapshot: RegistrySnapshot) {
        self.state.lock().await.snapshot = snapshot;
    }
}

impl PersistenceService for InMemoryPersistence {
    fn list_manifests<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WidgetTypeManifest>, ManagerError>> + Send + 'a>>
    {
        Box::pin(async move {
            Ok(self.state.lock().await.manifests.clone())
        })
    }

    fn fetch_manifest<'a>(
        &'a self,
        type_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<WidgetTypeManifest, ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .manifests
                .iter()
                .find(|m| m.id == type_id)
                .cloned()
                .ok_or_else(|| ManagerError::TypeNotFound(type_id.to_string()))
        })
    }

    fn fetch_registry<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<RegistrySnapshot, ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            Ok(self.state.lock().await.snapshot.clone())
        })
    }

    fn fetch_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<WidgetInstance, ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .snapshot
                .instances
                .iter()
                .find(|w| w.id == instance_id)
                .cloned()
                .ok_or_else(|| ManagerError::InstanceNotFound(instance_id.to_string()))
        })
    }

    fn create_instance<'a>(
        &'a self,
        instance: &'a WidgetInstance,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.fail_creates {
                return Err(ManagerError::Network("create_instance failed (injected)".into()));
            }
            state.snapshot.instances.push(instance.clone());
            Ok(())
        })
    }

    fn replace_registry<'a>(
        &'a self,
        snapshot: &'a RegistrySnapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            self.state.lock().await.snapshot = snapshot.clone();
            Ok(())
        })
    }

    fn delete_instance<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ManagerError>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.fail_deletes {
                return Err(ManagerError::Network("delete_instance failed (injected)".into()));
            }
            state
                .snapshot
                .instances
                .retain(|w| w.id != instance_id);
            state.deletes.push(instance_id.to_string());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::Position;

    fn manifest(id: &str) -> WidgetTypeManifest {
        WidgetTypeManifest {
            id: id.into(),
            name: id.into(),
            entrypoint: None,
        }
    }

    fn instance(id: &str, type_id: &str) -> WidgetInstance {
        WidgetInstance {
            id: id.into(),
            type_id: type_id.into(),
            name: type_id.into(),
            position: Position {
                x: 0.0,
                y: 0.0,
                width: 300.0,
                height: 200.0,
            },
        }
    }

    #[tokio::test]
    async fn in_memory_create_then_fetch() {
        let store = InMemoryPersistence::new(vec![manifest("clock")], RegistrySnapshot::default());

        store.create_instance(&instance("a", "clock")).await.unwrap();

        let snapshot = store.fetch_registry().await.unwrap();
        assert_eq!(snapshot.instances.len(), 1);
        let fetched = store.fetch_instance("a").await.unwrap();
        assert_eq!(fetched.type_id, "clock");
    }

    #[tokio::test]
    async fn injected_create_failure_leaves_store_untouched() {
        let store = InMemoryPersistence::new(vec![], RegistrySnapshot::default());
        store.fail_creates(true).await;

        let result = store.create_instance(&instance("a", "clock")).await;
        assert!(matches!(result, Err(ManagerError::Network(_))));
        assert!(store.stored_snapshot().await.instances.is_empty());
    }

    #[tokio::test]
    async fn delete_records_id_and_drops_instance() {
        let store = InMemoryPersistence::new(
            vec![],
            RegistrySnapshot {
                instances: vec![instance("a", "clock")],
            },
        );

        store.delete_instance("a").await.unwrap();
        assert_eq!(store.deleted_ids().await, vec!["a".to_string()]);
        assert!(store.stored_snapshot().await.instances.is_empty());
    }

    #[tokio::test]
    async fn replace_registry_overwrites_snapshot() {
        let store = InMemoryPersistence::new(
            vec![],
            RegistrySnapshot {
                instances: vec![instance("a", "clock")],
            },
        );

        store
            .replace_registry(&RegistrySnapshot {
                instances: vec![instance("b", "xkcd")],
            })
            .await
            .unwrap();

        let snapshot = store.fetch_registry().await.unwrap();
        assert_eq!(snapshot.instances.len(), 1);
        assert_eq!(snapshot.instances[0].id, "b");
    }

    #[tokio::test]
    async fn unknown_manifest_is_type_not_found() {
        let store = InMemoryPersistence::new(vec![manifest("clock")], RegistrySnapshot::default());
        let result = store.fetch_manifest("xkcd").await;
        assert!(matches!(result, Err(ManagerError::TypeNotFound(_))));
    }

    #[tokio::test]
    async fn http_client_maps_connection_failure_to_network_error() {
        // Port 9 (discard) is not listening; any send error must come back
        // as ManagerError::Network, never a panic.
        let client = HttpPersistence::new("http://127.0.0.1:9".into());
        let result = client.fetch_registry().await;
        assert!(matches!(result, Err(ManagerError::Network(_))));

        let result = client.replace_registry(&RegistrySnapshot::default()).await;
        assert!(matches!(result, Err(ManagerError::Network(_))));
    }
}
