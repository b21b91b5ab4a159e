//! Widget lifecycle management for the Hearth dashboard.
//!
//! Provides [`WidgetManager`], the single owner of the client-side registry
//! mirror and the available-types set. It loads widget-type definitions on
//! demand, keeps the mirror eventually consistent with the server-held
//! registry, and orchestrates create/remove/reload across concurrent
//! operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use hearth_core::Placement;
//! use hearth_manager::{
//!     DefinitionRegistry, HttpPersistence, LoaderTiming, LogSurfaceFactory,
//!     StaticDefinitionSource, TypeLoader, WidgetManager,
//! };
//!
//! # async fn run() {
//! let definitions = Arc::new(DefinitionRegistry::new());
//! let source = StaticDefinitionSource::new(Arc::clone(&definitions))
//!     .with_builtin("clock")
//!     .with_builtin("xkcd");
//! let loader = TypeLoader::new(Arc::new(source), definitions, LoaderTiming::default());
//!
//! let manager = WidgetManager::new(
//!     loader,
//!     Arc::new(HttpPersistence::new("http://localhost:8000".into())),
//!     Arc::new(LogSurfaceFactory),
//!     Placement::default(),
//! );
//!
//! // Mirror the server registry and mount everything loadable.
//! let mounted = manager.load_all().await;
//! println!("{} widgets mounted", mounted.len());
//! # }
//! ```

pub mod config;
pub mod definitions;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod persist;
pub mod registry;
pub mod surface;

pub use config::HearthConfig;
pub use definitions::{DefinitionRegistry, DefinitionSource, StaticDefinitionSource};
pub use error::ManagerError;
pub use lifecycle::WidgetManager;
pub use loader::{LoaderTiming, TypeLoader};
pub use persist::{HttpPersistence, InMemoryPersistence, PersistenceService};
pub use registry::{InstanceRegistry, LiveHandle};
pub use surface::{LogSurfaceFactory, SurfaceFactory, VisualSurface};
