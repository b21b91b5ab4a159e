use serde::{Deserialize, Serialize};

/// Descriptor of a loadable widget type, served by the persistence API.
///
/// Fetched once per session and treated as immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetTypeManifest {
    /// Stable type identifier (e.g. "clock")
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Reference to the type's executable definition, if the server exposes
    /// one (e.g. "/widgets/clock/widget.js"). Opaque to the manager.
    #[serde(default)]
    pub entrypoint: Option<String>,
}

/// The registration name a type's definition self-registers under once its
/// module has been evaluated.
///
/// Derivation is deterministic so the loader can observe registration
/// without ever inspecting the loaded code.
pub fn module_tag(type_id: &str) -> String {
    format!("{type_id}-widget")
}
