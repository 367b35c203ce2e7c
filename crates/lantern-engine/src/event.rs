//! Events the simulation reports to surrounding game code.
//!
//! Events are collected on [`SimulationState`](crate::state::SimulationState)
//! during a tick and handed out by
//! [`drain_events`](crate::state::SimulationState::drain_events). UI and audio
//! layers react to them; the simulation itself never reads them back.

use lantern_ecs::entity::EntityId;
use serde::{Deserialize, Serialize};

use crate::sensor::SensorCommandHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// An immediate sensor command was queued because `target` overlapped one
    /// of `entity`'s sensors.
    SensorCommandFired {
        entity: EntityId,
        command: SensorCommandHandle,
        target: EntityId,
    },

    /// The player triggered an available interaction.
    InteractionTriggered {
        entity: EntityId,
        command: SensorCommandHandle,
        target: EntityId,
    },

    /// A queued command returned an error. The rest of the drain still ran.
    CommandFailed { command: String, error: String },

    /// Game-specific event raised by a command.
    Custom {
        kind: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl SimulationEvent {
    pub fn custom(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            kind: kind.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_ecs::handle::Handle;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SimulationEvent::SensorCommandFired {
            entity: EntityId::new(1, 0),
            command: Handle::from_raw(7),
            target: EntityId::new(2, 0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sensor_command_fired");
        assert_eq!(json["command"], 7);

        let back: SimulationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn custom_payload_defaults_to_null() {
        let event: SimulationEvent =
            serde_json::from_str(r#"{ "type": "custom", "kind": "fridge_opened" }"#).unwrap();
        assert_eq!(event, SimulationEvent::custom("fridge_opened", serde_json::Value::Null));
    }
}
