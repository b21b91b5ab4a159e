use serde::{Deserialize, Serialize};

/// Events flowing into (and out of) the lifecycle manager.
///
/// Visual surfaces and the assistant chat may only emit these; they never
/// mutate manager state directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum DashboardEvent {
    /// The assistant asked for widgets to be reloaded. An empty id list
    /// means "reload everything".
    ReloadRequested {
        #[serde(default)]
        instance_ids: Vec<String>,
    },
    /// A surface's own close control was used.
    InstanceRemoved { instance_id: String },
    /// Forwarded to the external settings UI; not consumed by the manager.
    SettingsRequested { instance_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_event_defaults_to_empty_ids() {
        let event: DashboardEvent =
            serde_json::from_str(r#"{"event": "reload_requested"}"#).unwrap();
        assert_eq!(
            event,
            DashboardEvent::ReloadRequested {
                instance_ids: vec![]
            }
        );
    }

    #[test]
    fn remove_event_round_trips() {
        let event = DashboardEvent::InstanceRemoved {
            instance_id: "clock_1_1".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: DashboardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
