use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use hearth_core::module_tag;
use tokio::sync::{Mutex, RwLock};

use crate::definitions::{DefinitionRegistry, DefinitionSource};
use crate::error::ManagerError;

/// Registration-wait timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct LoaderTiming {
    /// Interval between checks of the registration predicate.
    pub poll_interval: Duration,
    /// Hard deadline for a single `ensure_type_loaded` wait.
    pub load_deadline: Duration,
}

impl Default for LoaderTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            load_deadline: Duration::from_millis(5000),
        }
    }
}

/// Loads widget-type definitions on demand and tracks which types are
/// usable this session.
///
/// The available-types set grows monotonically; a type that loaded once
/// stays available until the process exits. The load side effect for a
/// given type is triggered at most once per session, even under concurrent
/// `ensure_type_loaded` calls.
pub struct TypeLoader {
    source: Arc<dyn DefinitionSource>,
    definitions: Arc<DefinitionRegistry>,
    /// type_id → definition loaded successfully this session
    available: RwLock<HashSet<String>>,
    /// type_id → load side effect already triggered (never drained; after a
    /// timeout the orphaned load may still register later and be observed by
    /// a subsequent call)
    triggered: Mutex<HashSet<String>>,
    timing: LoaderTiming,
}

impl TypeLoader {
    pub fn new(
        source: Arc<dyn DefinitionSource>,
        definitions: Arc<DefinitionRegistry>,
        timing: LoaderTiming,
    ) -> Self {
        Self {
            source,
            definitions,
            available: RwLock::new(HashSet::new()),
            triggered: Mutex::new(HashSet::new()),
            timing,
        }
    }

    /// Make sure `type_id`'s definition is loaded and registered.
    ///
    /// Idempotent. Combines periodic polling of the registration predicate
    /// with a passive wake when the host signals completion; whichever fires
    /// first resolves the wait. Fails with [`ManagerError::LoadTimeout`] at
    /// the configured deadline; the underlying load is not cancelled.
    pub async fn ensure_type_loaded(&self, type_id: &str) -> Result<(), ManagerError> {
        if self.is_available(type_id).await {
            return Ok(());
        }

        let tag = module_tag(type_id);
        if self.definitions.is_registered(&tag) {
            self.mark_available(type_id).await;
            return Ok(());
        }

        // Per-type in-flight guard: only the first caller triggers the load.
        let first = {
            let mut triggered = self.triggered.lock().await;
            triggered.insert(type_id.to_string())
        };
        if first {
            tracing::info!(type_id, "Triggering definition load");
            self.source.begin_load(type_id).await;
        } else {
            tracing::debug!(type_id, "Load already in flight, waiting");
        }

        let deadline = tokio::time::sleep(self.timing.load_deadline);
        tokio::pin!(deadline);

        loop {
            if self.definitions.is_registered(&tag) {
                self.mark_available(type_id).await;
                return Ok(());
            }

            tokio::select! {
                () = &mut deadline => {
                    if self.definitions.is_registered(&tag) {
                        self.mark_available(type_id).await;
                        return Ok(());
                    }
                    tracing::warn!(
                        type_id,
                        deadline_ms = self.timing.load_deadline.as_millis() as u64,
                        "Timed out waiting for type registration"
                    );
                    return Err(ManagerError::LoadTimeout {
                        type_id: type_id.to_string(),
                    });
                }
                () = self.definitions.notified() => {}
                () = tokio::time::sleep(self.timing.poll_interval) => {}
            }
        }
    }

    pub async fn is_available(&self, type_id: &str) -> bool {
        self.available.read().await.contains(type_id)
    }

    /// Snapshot of the types whose definitions have loaded this session.
    pub async fn available_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.available.read().await.iter().cloned().collect();
        types.sort();
        types
    }

    async fn mark_available(&self, type_id: &str) {
        let newly = self.available.write().await.insert(type_id.to_string());
        if newly {
            tracing::info!(type_id, "Widget type available");
        }
    }
}
