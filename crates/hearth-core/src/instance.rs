use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// On-dashboard placement of a widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Default-placement parameters for newly created instances.
///
/// New widgets land near `(origin_x, origin_y)` with a random offset of up to
/// `jitter` on each axis, so consecutive creations don't stack exactly on top
/// of each other.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub origin_x: f64,
    pub origin_y: f64,
    pub jitter: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            origin_x: 100.0,
            origin_y: 100.0,
            jitter: 100.0,
            width: 300.0,
            height: 200.0,
        }
    }
}

impl Placement {
    /// Pick a jittered default position for a new instance.
    pub fn pick(&self) -> Position {
        let mut rng = rand::thread_rng();
        Position {
            x: self.origin_x + rng.gen_range(0.0..self.jitter.max(f64::MIN_POSITIVE)),
            y: self.origin_y + rng.gen_range(0.0..self.jitter.max(f64::MIN_POSITIVE)),
            width: self.width,
            height: self.height,
        }
    }
}

/// A persisted record of one widget placed on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetInstance {
    /// Unique, stable instance id (see [`new_instance_id`])
    pub id: String,
    /// Widget type this instance renders (wire name "type")
    #[serde(rename = "type")]
    pub type_id: String,
    /// Display name shown in the widget chrome
    pub name: String,
    pub position: Position,
}

/// The server-held list of widget instances, mirrored by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(rename = "widgets", default)]
    pub instances: Vec<WidgetInstance>,
}

/// Generate a process-unique instance id: `{type}_{unix_ms}_{suffix}`.
///
/// Timestamp plus a random 0..1000 suffix. This is a heuristic, not a strong
/// uniqueness guarantee; collisions are only checked against the local
/// mirror.
pub fn new_instance_id(type_id: &str) -> String {
    let unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{type_id}_{unix_ms}_{suffix}")
}
