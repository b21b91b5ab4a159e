use std::collections::HashMap;

use hearth_core::{RegistrySnapshot, WidgetInstance};

use crate::surface::VisualSurface;

/// Runtime binding between a mirrored instance record and its mounted
/// surface. Exists only while mounted; dropping it destroys the surface.
pub struct LiveHandle {
    surface: Box<dyn VisualSurface>,
}

impl LiveHandle {
    pub fn new(surface: Box<dyn VisualSurface>) -> Self {
        Self { surface }
    }

    pub fn instance_id(&self) -> &str {
        self.surface.instance_id()
    }

    fn unmount(mut self) {
        self.surface.unmount();
    }
}

/// Client-side mirror of the server's widget-instance registry, plus the
/// live handles for currently mounted instances.
///
/// The server copy is authoritative; this mirror is eventually consistent
/// with it after each operation completes. Order of the mirrored records is
/// preserved from the server snapshot.
#[derive(Default)]
pub struct InstanceRegistry {
    instances: Vec<WidgetInstance>,
    live: HashMap<String, LiveHandle>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mirror completely with a fresh server snapshot.
    ///
    /// Every live handle is unmounted first; stale instances not present in
    /// the new snapshot are dropped. A record id may appear in the mirror at
    /// most once, so duplicate ids in the snapshot keep their first
    /// occurrence only. Mounting of the new records is the lifecycle
    /// manager's job, after type loads settle.
    pub fn replace_all(&mut self, snapshot: RegistrySnapshot) {
        self.unmount_all();
        self.instances.clear();
        for instance in snapshot.instances {
            if self.contains(&instance.id) {
                tracing::warn!(instance_id = %instance.id, "Duplicate id in snapshot, keeping first");
                continue;
            }
            self.instances.push(instance);
        }
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.instances.iter().any(|w| w.id == instance_id)
    }

    pub fn get(&self, instance_id: &str) -> Option<&WidgetInstance> {
        self.instances.iter().find(|w| w.id == instance_id)
    }

    /// Append a record to the mirror. The caller has already checked for
    /// duplicates.
    pub fn push(&mut self, instance: WidgetInstance) {
        self.instances.push(instance);
    }

    /// Drop a record from the mirror, unmounting its live handle if any.
    /// Returns the removed record, or `None` for an unknown id.
    pub fn remove(&mut self, instance_id: &str) -> Option<WidgetInstance> {
        self.detach(instance_id);
        let idx = self.instances.iter().position(|w| w.id == instance_id)?;
        Some(self.instances.remove(idx))
    }

    /// Swap a mirrored record in place (targeted reload). Falls back to
    /// append when the id was not mirrored.
    pub fn upsert(&mut self, instance: WidgetInstance) {
        match self.instances.iter_mut().find(|w| w.id == instance.id) {
            Some(slot) => *slot = instance,
            None => self.instances.push(instance),
        }
    }

    pub fn instances(&self) -> &[WidgetInstance] {
        &self.instances
    }

    pub fn is_mounted(&self, instance_id: &str) -> bool {
        self.live.contains_key(instance_id)
    }

    pub fn mounted_count(&self) -> usize {
        self.live.len()
    }

    /// Bind a live handle to a mirrored instance.
    pub fn attach(&mut self, handle: LiveHandle) {
        self.live.insert(handle.instance_id().to_string(), handle);
    }

    /// Unmount and destroy the live handle for `instance_id`, if mounted.
    /// Synchronous; the surface is gone when this returns.
    pub fn detach(&mut self, instance_id: &str) -> bool {
        match self.live.remove(instance_id) {
            Some(handle) => {
                handle.unmount();
                true
            }
            None => false,
        }
    }

    fn unmount_all(&mut self) {
        for (_, handle) in self.live.drain() {
            handle.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::Position;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

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

    struct CountingSurface {
        id: String,
        unmounts: Arc<AtomicUsize>,
    }

    impl VisualSurface for CountingSurface {
        fn instance_id(&self) -> &str {
            &self.id
        }

        fn unmount(&mut self) {
            self.unmounts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn handle(id: &str, unmounts: &Arc<AtomicUsize>) -> LiveHandle {
        LiveHandle::new(Box::new(CountingSurface {
            id: id.into(),
            unmounts: Arc::clone(unmounts),
        }))
    }

    #[test]
    fn replace_all_unmounts_stale_handles() {
        let unmounts = Arc::new(AtomicUsize::new(0));
        let mut registry = InstanceRegistry::new();
        registry.push(instance("a", "clock"));
        registry.attach(handle("a", &unmounts));

        registry.replace_all(RegistrySnapshot {
            instances: vec![instance("b", "xkcd")],
        });

        assert_eq!(unmounts.load(Ordering::SeqCst), 1);
        assert!(!registry.contains("a"));
        assert!(registry.contains("b"));
        assert_eq!(registry.mounted_count(), 0);
    }

    #[test]
    fn remove_unmounts_and_drops_record() {
        let unmounts = Arc::new(AtomicUsize::new(0));
        let mut registry = InstanceRegistry::new();
        registry.push(instance("a", "clock"));
        registry.attach(handle("a", &unmounts));

        let removed = registry.remove("a");
        assert!(removed.is_some());
        assert_eq!(unmounts.load(Ordering::SeqCst), 1);
        assert!(!registry.contains("a"));
        assert!(!registry.is_mounted("a"));
    }

    #[test]
    fn remove_unknown_id_is_none() {
        let mut registry = InstanceRegistry::new();
        assert!(registry.remove("ghost").is_none());
    }

    #[test]
    fn upsert_replaces_in_place_preserving_order() {
        let mut registry = InstanceRegistry::new();
        registry.push(instance("a", "clock"));
        registry.push(instance("b", "xkcd"));

        let mut updated = instance("a", "clock");
        updated.name = "Updated".into();
        registry.upsert(updated);

        assert_eq!(registry.instances()[0].name, "Updated");
        assert_eq!(registry.instances()[1].id, "b");
        assert_eq!(registry.instances().len(), 2);
    }

    #[test]
    fn replace_all_keeps_first_of_duplicate_ids() {
        let mut registry = InstanceRegistry::new();
        let mut dup = instance("a", "xkcd");
        dup.name = "second".into();
        registry.replace_all(RegistrySnapshot {
            instances: vec![instance("a", "clock"), dup],
        });

        assert_eq!(registry.instances().len(), 1);
        assert_eq!(registry.instances()[0].type_id, "clock");
    }

    #[test]
    fn detach_is_false_for_unmounted() {
        let mut registry = InstanceRegistry::new();
        registry.push(instance("a", "clock"));
        assert!(!registry.detach("a"));
    }
}
