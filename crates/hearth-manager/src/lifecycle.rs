use std::sync::Arc;

use futures::future::join_all;
use hearth_core::{DashboardEvent, Placement, WidgetInstance, new_instance_id};
use tokio::sync::{Mutex, mpsc};

use crate::error::ManagerError;
use crate::loader::TypeLoader;
use crate::persist::PersistenceService;
use crate::registry::{InstanceRegistry, LiveHandle};
use crate::surface::SurfaceFactory;

/// Orchestrates widget lifecycle across the loader, the registry mirror, and
/// the persistence service.
///
/// `WidgetManager` owns the registry mirror and the available-types set
/// exclusively; visual surfaces and the assistant interact with it only
/// through its methods and the [`DashboardEvent`] channel. No operation here
/// is process-fatal: every failure degrades to a logged, partial outcome and
/// the rest of the dashboard keeps running.
pub struct WidgetManager {
    registry: Mutex<InstanceRegistry>,
    loader: TypeLoader,
    persistence: Arc<dyn PersistenceService>,
    surfaces: Arc<dyn SurfaceFactory>,
    placement: Placement,
    settings_tx: Option<mpsc::UnboundedSender<String>>,
}

impl WidgetManager {
    pub fn new(
        loader: TypeLoader,
        persistence: Arc<dyn PersistenceService>,
        surfaces: Arc<dyn SurfaceFactory>,
        placement: Placement,
    ) -> Self {
        Self {
            registry: Mutex::new(InstanceRegistry::new()),
            loader,
            persistence,
            surfaces,
            placement,
            settings_tx: None,
        }
    }

    /// Forward `settings-requested` events to an external settings UI.
    pub fn with_settings_sink(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.settings_tx = Some(tx);
        self
    }

    /// Full resync against the server registry.
    ///
    /// Fetches the latest snapshot, replaces the mirror completely (stale
    /// instances are unmounted and dropped), loads every advertised and
    /// referenced type concurrently, then mounts each instance whose type is
    /// available. Instances whose type failed to load are skipped and
    /// dropped from the mirror; one missing type never aborts the whole
    /// load. Returns the ids that ended up mounted.
    pub async fn load_all(&self) -> Vec<String> {
        let snapshot = match self.persistence.fetch_registry().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch registry snapshot");
                return Vec::new();
            }
        };

        let records = {
            let mut registry = self.registry.lock().await;
            registry.replace_all(snapshot);
            registry.instances().to_vec()
        };

        // Load every type the server advertises plus any the snapshot
        // references; a manifest-listing failure degrades to the referenced
        // set.
        let mut type_ids: Vec<String> = records.iter().map(|w| w.type_id.clone()).collect();
        match self.persistence.list_manifests().await {
            Ok(manifests) => type_ids.extend(manifests.into_iter().map(|m| m.id)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list type manifests");
            }
        }
        type_ids.sort();
        type_ids.dedup();

        let outcomes = join_all(
            type_ids
                .iter()
                .map(|type_id| self.loader.ensure_type_loaded(type_id)),
        )
        .await;

        for (type_id, outcome) in type_ids.iter().zip(outcomes) {
            if let Err(e) = outcome {
                tracing::warn!(type_id, error = %e, "Widget type failed to load");
            }
        }

        let mut registry = self.registry.lock().await;
        let mut mounted = Vec::new();
        for record in &records {
            match self.mount_record(&mut registry, record).await {
                Ok(()) => mounted.push(record.id.clone()),
                Err(e) => {
                    tracing::warn!(
                        instance_id = %record.id,
                        type_id = %record.type_id,
                        error = %e,
                        "Skipping instance"
                    );
                }
            }
        }

        // The mirror keeps exactly the successfully mounted subset.
        for record in &records {
            if !mounted.contains(&record.id) {
                registry.remove(&record.id);
            }
        }

        tracing::info!(
            total = records.len(),
            mounted = mounted.len(),
            "Registry loaded"
        );
        mounted
    }

    /// Create a new instance of `type_id` with a jittered default placement.
    ///
    /// Persistence must succeed before anything is mirrored or mounted; on
    /// persistence failure nothing changes locally. A type that never loads
    /// still counts as a successful create: the record is persisted and
    /// mirrored, just not mounted, and the next full load reconciles it.
    pub async fn create(&self, type_id: &str) -> Result<WidgetInstance, ManagerError> {
        let manifest = self.persistence.fetch_manifest(type_id).await.map_err(|e| {
            tracing::error!(type_id, error = %e, "Failed to fetch type manifest");
            e
        })?;

        let instance = WidgetInstance {
            id: new_instance_id(type_id),
            type_id: type_id.to_string(),
            name: manifest.name,
            position: self.placement.pick(),
        };
        self.create_record(instance).await
    }

    /// Create from a fully specified record (assistant-driven creation).
    pub async fn create_record(
        &self,
        instance: WidgetInstance,
    ) -> Result<WidgetInstance, ManagerError> {
        {
            let registry = self.registry.lock().await;
            if registry.contains(&instance.id) {
                tracing::warn!(instance_id = %instance.id, "Instance already exists, ignoring create");
                return Err(ManagerError::DuplicateInstance(instance.id));
            }
        }

        // Persist before any local mutation.
        if let Err(e) = self.persistence.create_instance(&instance).await {
            tracing::error!(instance_id = %instance.id, error = %e, "Failed to persist new instance");
            return Err(e);
        }

        if let Err(e) = self.loader.ensure_type_loaded(&instance.type_id).await {
            tracing::warn!(
                instance_id = %instance.id,
                type_id = %instance.type_id,
                error = %e,
                "Type did not load; instance persisted but not mounted"
            );
        }

        let mut registry = self.registry.lock().await;
        // Re-check under the lock: a concurrent create may have mirrored the
        // same id while persistence was in flight.
        if registry.contains(&instance.id) {
            tracing::warn!(instance_id = %instance.id, "Instance mirrored concurrently, ignoring create");
            return Err(ManagerError::DuplicateInstance(instance.id));
        }
        registry.push(instance.clone());
        if let Err(e) = self.mount_record(&mut registry, &instance).await {
            if !e.is_guard() {
                return Err(e);
            }
            tracing::warn!(instance_id = %instance.id, "Created without a mounted surface");
        }

        tracing::info!(
            instance_id = %instance.id,
            type_id = %instance.type_id,
            "Instance created"
        );
        Ok(instance)
    }

    /// Remove an instance: unmount, drop from the mirror, and delete on the
    /// server asynchronously.
    ///
    /// The local removal is optimistic; a failed server delete is logged
    /// only, and the divergence closes at the next [`Self::load_all`].
    /// Unknown ids are a no-op.
    pub async fn remove(&self, instance_id: &str) {
        let removed = {
            let mut registry = self.registry.lock().await;
            registry.remove(instance_id)
        };

        if removed.is_none() {
            tracing::debug!(instance_id, "Remove for unknown instance, ignoring");
            return;
        }
        tracing::info!(instance_id, "Instance removed");

        let persistence = Arc::clone(&self.persistence);
        let id = instance_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = persistence.delete_instance(&id).await {
                tracing::warn!(
                    instance_id = %id,
                    error = %e,
                    "Server delete failed; state diverges until the next full load"
                );
            }
        });
    }

    /// Reload specific instances with freshly fetched records, or resync
    /// everything when `instance_ids` is empty.
    pub async fn reload(&self, instance_ids: &[String]) -> Vec<String> {
        if instance_ids.is_empty() {
            return self.load_all().await;
        }

        let mut reloaded = Vec::new();
        for instance_id in instance_ids {
            match self.reload_one(instance_id).await {
                Ok(()) => reloaded.push(instance_id.clone()),
                Err(e) => {
                    tracing::warn!(instance_id, error = %e, "Reload failed for instance");
                }
            }
        }
        reloaded
    }

    async fn reload_one(&self, instance_id: &str) -> Result<(), ManagerError> {
        // Unmount first so the remount below starts from a clean handle.
        {
            let mut registry = self.registry.lock().await;
            registry.detach(instance_id);
        }

        let fresh = self.persistence.fetch_instance(instance_id).await?;
        self.loader.ensure_type_loaded(&fresh.type_id).await?;

        let mut registry = self.registry.lock().await;
        registry.upsert(fresh.clone());
        self.mount_record(&mut registry, &fresh).await
    }

    /// React to an event from a surface or the assistant chat.
    pub async fn handle_event(&self, event: DashboardEvent) {
        match event {
            DashboardEvent::ReloadRequested { instance_ids } => {
                self.reload(&instance_ids).await;
            }
            DashboardEvent::InstanceRemoved { instance_id } => {
                self.remove(&instance_id).await;
            }
            DashboardEvent::SettingsRequested { instance_id } => {
                tracing::debug!(instance_id = %instance_id, "Forwarding settings request");
                if let Some(tx) = &self.settings_tx {
                    let _ = tx.send(instance_id);
                }
            }
        }
    }

    /// Drain the event channel until every sender is gone.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<DashboardEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(event).await;
        }
    }

    /// Current mirror contents, in server order.
    pub async fn instances(&self) -> Vec<WidgetInstance> {
        self.registry.lock().await.instances().to_vec()
    }

    pub async fn mounted_count(&self) -> usize {
        self.registry.lock().await.mounted_count()
    }

    pub async fn is_mounted(&self, instance_id: &str) -> bool {
        self.registry.lock().await.is_mounted(instance_id)
    }

    /// Types whose definitions have loaded this session.
    pub async fn available_types(&self) -> Vec<String> {
        self.loader.available_types().await
    }

    /// Mount one mirrored record, enforcing the live-handle invariant: the
    /// id must not already be mounted and the type must be available.
    async fn mount_record(
        &self,
        registry: &mut InstanceRegistry,
        instance: &WidgetInstance,
    ) -> Result<(), ManagerError> {
        if registry.is_mounted(&instance.id) {
            tracing::warn!(instance_id = %instance.id, "Instance already mounted, ignoring");
            return Err(ManagerError::DuplicateInstance(instance.id.clone()));
        }
        if !self.loader.is_available(&instance.type_id).await {
            tracing::error!(
                instance_id = %instance.id,
                type_id = %instance.type_id,
                "Widget type not available, refusing to mount"
            );
            return Err(ManagerError::UnavailableType(instance.type_id.clone()));
        }

        registry.attach(LiveHandle::new(self.surfaces.mount(instance)));
        Ok(())
    }
}
