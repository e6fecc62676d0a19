use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use utoipa::ToSchema;

/// Placeholder shown for a numeric reading the remote node does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

/// The three relays exposed by the sensor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Relay {
    Relay1,
    Relay2,
    Relay3,
}

impl Relay {
    pub const ALL: [Relay; 3] = [Relay::Relay1, Relay::Relay2, Relay::Relay3];

    pub fn as_str(self) -> &'static str {
        match self {
            Relay::Relay1 => "Relay1",
            Relay::Relay2 => "Relay2",
            Relay::Relay3 => "Relay3",
        }
    }

    /// Field name of this relay's status inside the remote sensor node.
    pub fn status_field(self) -> &'static str {
        match self {
            Relay::Relay1 => "Relay1_Status",
            Relay::Relay2 => "Relay2_Status",
            Relay::Relay3 => "Relay3_Status",
        }
    }

    /// Full database path of the status field below `root`.
    pub fn status_path(self, root: &str) -> String {
        format!("{}/{}", root.trim_end_matches('/'), self.status_field())
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RelayState / Motion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum RelayState {
    #[serde(rename = "ON")]
    On,
    #[default]
    #[serde(rename = "OFF")]
    Off,
}

impl RelayState {
    fn from_status(raw: Option<&Value>) -> Self {
        if raw.is_some_and(is_truthy) {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Value a toggle writes to the status field: the negation of `self`.
    pub fn toggled_value(self) -> u8 {
        match self {
            RelayState::On => 0,
            RelayState::Off => 1,
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelayState::On => "ON",
            RelayState::Off => "OFF",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Motion {
    #[serde(rename = "Motion Detected")]
    Detected,
    #[default]
    #[serde(rename = "No Motion")]
    Idle,
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Motion::Detected => "Motion Detected",
            Motion::Idle => "No Motion",
        })
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A numeric telemetry field as received. Anything other than `null` is
/// passed through untouched; absence becomes [`Reading::Unavailable`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reading {
    Available(Value),
    #[default]
    Unavailable,
}

impl Reading {
    fn from_field(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => Self::Unavailable,
            Some(v) => Self::Available(v.clone()),
        }
    }

    /// Rendered value with `unit` appended, or bare `N/A` when unavailable.
    pub fn with_unit(&self, unit: &str) -> String {
        match self {
            Reading::Available(_) => format!("{self}{unit}"),
            Reading::Unavailable => NOT_AVAILABLE.to_owned(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Available(Value::String(s)) => f.write_str(s),
            Reading::Available(v) => write!(f, "{v}"),
            Reading::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Available(v) => v.serialize(serializer),
            Reading::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

// ---------------------------------------------------------------------------
// SensorSnapshot
// ---------------------------------------------------------------------------

/// Display-ready projection of the remote sensor node.
///
/// Replaced wholesale on every update; the default value is the placeholder
/// state shown before the first document arrives.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SensorSnapshot {
    #[serde(rename = "Temperature")]
    pub temperature: Reading,
    #[serde(rename = "Humidity")]
    pub humidity: Reading,
    #[serde(rename = "GasLevel")]
    pub gas_level: Reading,
    #[serde(rename = "PIR")]
    pub pir: Motion,
    #[serde(rename = "Relay1")]
    pub relay1: RelayState,
    #[serde(rename = "Relay2")]
    pub relay2: RelayState,
    #[serde(rename = "Relay3")]
    pub relay3: RelayState,
}

impl SensorSnapshot {
    /// Project a received node document.
    ///
    /// Returns `None` when the payload itself is falsy (`null`, `false`, `0`,
    /// `""`); callers keep their previous snapshot in that case.
    pub fn from_node(node: &Value) -> Option<Self> {
        if !is_truthy(node) {
            return None;
        }

        Some(Self {
            temperature: Reading::from_field(node.get("Temperature")),
            humidity: Reading::from_field(node.get("Humidity")),
            gas_level: Reading::from_field(node.get("GasLevel")),
            pir: if node.get("PIR").is_some_and(is_truthy) {
                Motion::Detected
            } else {
                Motion::Idle
            },
            relay1: RelayState::from_status(node.get(Relay::Relay1.status_field())),
            relay2: RelayState::from_status(node.get(Relay::Relay2.status_field())),
            relay3: RelayState::from_status(node.get(Relay::Relay3.status_field())),
        })
    }

    pub fn relay(&self, relay: Relay) -> RelayState {
        match relay {
            Relay::Relay1 => self.relay1,
            Relay::Relay2 => self.relay2,
            Relay::Relay3 => self.relay3,
        }
    }

    pub fn temperature_display(&self) -> String {
        self.temperature.with_unit("°C")
    }

    pub fn humidity_display(&self) -> String {
        self.humidity.with_unit("%")
    }

    pub fn gas_level_display(&self) -> String {
        self.gas_level.to_string()
    }

    /// One-line human summary used for event log entries.
    pub fn summary(&self) -> String {
        format!(
            "Temperature {}, Humidity {}, Gas Level {}, PIR {}, Relay1 {}, Relay2 {}, Relay3 {}",
            self.temperature_display(),
            self.humidity_display(),
            self.gas_level_display(),
            self.pir,
            self.relay1,
            self.relay2,
            self.relay3,
        )
    }
}

/// Truthiness as applied by the firmware and browser clients writing the
/// node: `null`, `false`, `0`, `NaN` and `""` are false, everything else true.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_snapshot_is_all_placeholders() {
        let s = SensorSnapshot::default();
        assert_eq!(s.temperature_display(), "N/A");
        assert_eq!(s.humidity_display(), "N/A");
        assert_eq!(s.gas_level_display(), "N/A");
        assert_eq!(s.pir.to_string(), "No Motion");
        for relay in Relay::ALL {
            assert_eq!(s.relay(relay).to_string(), "OFF");
        }
    }

    #[test]
    fn missing_numeric_fields_are_not_available() {
        let s = SensorSnapshot::from_node(&json!({ "PIR": false })).unwrap();
        assert_eq!(s.temperature, Reading::Unavailable);
        assert_eq!(s.humidity.to_string(), "N/A");
        assert_eq!(s.gas_level.to_string(), "N/A");
    }

    #[test]
    fn null_numeric_field_is_not_available() {
        let s = SensorSnapshot::from_node(&json!({ "Temperature": null })).unwrap();
        assert_eq!(s.temperature_display(), "N/A");
    }

    #[test]
    fn zero_reading_is_passed_through() {
        let s = SensorSnapshot::from_node(&json!({ "GasLevel": 0 })).unwrap();
        assert_eq!(s.gas_level_display(), "0");
    }

    #[test]
    fn end_to_end_payload_projection() {
        let s = SensorSnapshot::from_node(&json!({
            "Temperature": 22.5,
            "PIR": true,
            "Relay1_Status": false
        }))
        .unwrap();
        assert_eq!(s.temperature_display(), "22.5°C");
        assert_eq!(s.pir.to_string(), "Motion Detected");
        assert_eq!(s.relay1.to_string(), "OFF");
        assert_eq!(s.humidity_display(), "N/A");
        assert_eq!(s.gas_level_display(), "N/A");
    }

    #[test]
    fn truthy_relay_status_is_on() {
        for raw in [json!(true), json!(1), json!("1"), json!(2.5)] {
            let s = SensorSnapshot::from_node(&json!({ "Relay2_Status": raw })).unwrap();
            assert_eq!(s.relay2, RelayState::On, "status {raw} should be ON");
        }
    }

    #[test]
    fn falsy_or_absent_relay_status_is_off() {
        for raw in [json!(false), json!(0), json!(""), Value::Null] {
            let s = SensorSnapshot::from_node(&json!({ "Relay3_Status": raw })).unwrap();
            assert_eq!(s.relay3, RelayState::Off, "status {raw} should be OFF");
        }
        let s = SensorSnapshot::from_node(&json!({ "Temperature": 1 })).unwrap();
        assert_eq!(s.relay3, RelayState::Off);
    }

    #[test]
    fn falsy_payload_yields_nothing() {
        assert!(SensorSnapshot::from_node(&Value::Null).is_none());
        assert!(SensorSnapshot::from_node(&json!(0)).is_none());
        assert!(SensorSnapshot::from_node(&json!(false)).is_none());
    }

    #[test]
    fn toggled_value_negates_state() {
        assert_eq!(RelayState::On.toggled_value(), 0);
        assert_eq!(RelayState::Off.toggled_value(), 1);
    }

    #[test]
    fn string_reading_renders_without_quotes() {
        let s = SensorSnapshot::from_node(&json!({ "Temperature": "21" })).unwrap();
        assert_eq!(s.temperature_display(), "21°C");
    }

    #[test]
    fn snapshot_serializes_with_node_field_names() {
        let s = SensorSnapshot::from_node(&json!({ "Temperature": 22.5, "Relay1_Status": 1 }))
            .unwrap();
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["Temperature"], json!(22.5));
        assert_eq!(v["Humidity"], json!("N/A"));
        assert_eq!(v["PIR"], json!("No Motion"));
        assert_eq!(v["Relay1"], json!("ON"));
        assert_eq!(v["Relay2"], json!("OFF"));
    }

    #[test]
    fn relay_paths_and_wire_names() {
        assert_eq!(Relay::Relay2.status_path("/SensorData"), "/SensorData/Relay2_Status");
        assert_eq!(serde_json::from_value::<Relay>(json!("Relay3")).unwrap(), Relay::Relay3);
        assert!(serde_json::from_value::<Relay>(json!("Relay4")).is_err());
    }
}
