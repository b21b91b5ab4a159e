//! Core data model for the Hearth widget dashboard.
//!
//! Pure data: widget-type manifests, persisted instance records, placement
//! geometry, and the dashboard event surface. No I/O lives here; the
//! lifecycle logic is in `hearth-manager`.

pub mod events;
pub mod instance;
pub mod manifest;

pub use events::DashboardEvent;
pub use instance::{Placement, Position, RegistrySnapshot, WidgetInstance, new_instance_id};
pub use manifest::{WidgetTypeManifest, module_tag};
