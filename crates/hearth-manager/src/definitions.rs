use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use hearth_core::module_tag;
use tokio::sync::Notify;

/// Registration surface for widget-type definitions.
///
/// When a type's definition module finishes evaluating it self-registers
/// here under its [`module_tag`]. The loader only ever observes this
/// registry; it never inspects the loaded code.
#[derive(Default)]
pub struct DefinitionRegistry {
    registered: RwLock<HashSet<String>>,
    notify: Notify,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a registration and wake everyone waiting on it.
    pub fn register(&self, tag: &str) {
        self.insert(tag);
        self.notify.notify_waiters();
        tracing::debug!(tag, "Definition registered");
    }

    /// Record a registration without waking waiters.
    ///
    /// For load paths where the host cannot signal completion; waiters
    /// observe the registration on their next poll tick instead.
    pub fn register_silent(&self, tag: &str) {
        self.insert(tag);
        tracing::debug!(tag, "Definition registered (silent)");
    }

    /// The "is this type now registered" predicate the loader polls.
    pub fn is_registered(&self, tag: &str) -> bool {
        self.registered
            .read()
            .map(|set| set.contains(tag))
            .unwrap_or(false)
    }

    /// Resolves on the next registration signal.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    fn insert(&self, tag: &str) {
        if let Ok(mut set) = self.registered.write() {
            set.insert(tag.to_string());
        }
    }
}

/// Trigger for a widget type's load side effect.
///
/// `begin_load` causes the type's executable definition to be fetched and
/// evaluated, after which it is expected to self-register its [`module_tag`]
/// with the [`DefinitionRegistry`]. Fire-and-forget: the manager never
/// cancels an in-flight load, it only stops waiting for it.
pub trait DefinitionSource: Send + Sync {
    fn begin_load<'a>(
        &'a self,
        type_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Load hook for one widget type, declared up front.
pub type LoadHook =
    Arc<dyn Fn(Arc<DefinitionRegistry>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Definition source backed by a declared type-id → hook mapping.
///
/// The mapping is resolved at construction time; there is no dynamic path
/// construction. Unknown type ids are logged and ignored (their load simply
/// never registers, and the waiting caller times out).
pub struct StaticDefinitionSource {
    registry: Arc<DefinitionRegistry>,
    hooks: HashMap<String, LoadHook>,
}

impl StaticDefinitionSource {
    pub fn new(registry: Arc<DefinitionRegistry>) -> Self {
        Self {
            registry,
            hooks: HashMap::new(),
        }
    }

    pub fn with_hook(mut self, type_id: &str, hook: LoadHook) -> Self {
        self.hooks.insert(type_id.to_string(), hook);
        self
    }

    /// Declare a type whose definition is bundled with the host: loading it
    /// registers the module tag immediately.
    pub fn with_builtin(self, type_id: &str) -> Self {
        let tag = module_tag(type_id);
        self.with_hook(
            type_id,
            Arc::new(move |registry: Arc<DefinitionRegistry>| {
                let tag = tag.clone();
                Box::pin(async move {
                    registry.register(&tag);
                })
            }),
        )
    }
}

impl DefinitionSource for StaticDefinitionSource {
    fn begin_load<'a>(
        &'a self,
        type_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            match self.hooks.get(type_id) {
                Some(hook) => {
                    let fut = hook(Arc::clone(&self.registry));
                    tokio::spawn(fut);
                }
                None => {
                    tracing::warn!(type_id, "No load hook declared for widget type");
                }
            }
        })
    }
}
