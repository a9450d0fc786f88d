use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Instruction,
    Recalculating,
    StopReached,
    Arrived,
}

/// Record written to the event log, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEvent {
    pub ts_unix_ms: i64,
    pub kind: EventKind,
    pub lat: f64,
    pub lng: f64,
    pub text: String,
    // Stop bookkeeping
    pub stop_id: Option<String>,
    pub stop_index: Option<usize>,
    // Maneuver bookkeeping
    pub maneuver: Option<usize>,
    pub stage: Option<String>,
}

impl NavEvent {
    pub fn new(kind: EventKind, lat: f64, lng: f64, text: impl Into<String>) -> Self {
        Self {
            ts_unix_ms: 0,
            kind,
            lat,
            lng,
            text: text.into(),
            stop_id: None,
            stop_index: None,
            maneuver: None,
            stage: None,
        }
    }

    pub fn stamped(mut self, ts_unix_ms: i64) -> Self {
        self.ts_unix_ms = ts_unix_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        let ev = NavEvent::new(EventKind::StopReached, 52.0, 4.0, "Rijksmuseum").stamped(1_700_000_000_000);
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"kind\":\"stop_reached\""));
        assert!(json.contains("\"ts_unix_ms\":1700000000000"));
    }
}
