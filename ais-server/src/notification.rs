//! JSON payloads for service events.
//!
//! One flat object per warning or safety text message, printed as a JSON
//! line by `ais track --json`.

use ais_core::mmsi::format_mmsi;
use ais_core::registry::TrackEvent;
use ais_core::safety::AisWarning;
use serde_json::Value;

use crate::service::ServiceEvent;

pub fn warning_payload(warning: &AisWarning) -> Value {
    serde_json::json!({
        "type": "warning",
        "mmsi": format_mmsi(warning.mmsi),
        "warning_type": warning.warning_type,
        "message": warning.message,
        "timestamp": warning.timestamp.to_rfc3339(),
    })
}

/// `None` for anything but a text message.
pub fn text_payload(event: &TrackEvent) -> Option<Value> {
    let TrackEvent::TextMessage {
        source,
        destination,
        text,
        timestamp,
    } = event
    else {
        return None;
    };
    Some(serde_json::json!({
        "type": "text",
        "mmsi": format_mmsi(*source),
        "destination": destination.map(format_mmsi),
        "message": text,
        "timestamp": timestamp.to_rfc3339(),
    }))
}

pub fn event_payload(event: &ServiceEvent) -> Option<Value> {
    match event {
        ServiceEvent::Warning(w) => Some(warning_payload(w)),
        ServiceEvent::Text(e) => text_payload(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ais_core::safety::AisWarningType;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_warning_payload() {
        let warning = AisWarning {
            mmsi: 2579999,
            warning_type: AisWarningType::DangerousVessel,
            message: "DANGEROUS VESSEL 002579999: DISTANCE 0.40 NM".into(),
            timestamp: Utc.with_ymd_and_hms(2023, 11, 1, 10, 10, 0).unwrap(),
        };
        let payload = warning_payload(&warning);
        assert_eq!(payload["type"], "warning");
        assert_eq!(payload["mmsi"], "002579999");
        assert_eq!(payload["warning_type"], "DangerousVessel");
        assert_eq!(payload["timestamp"], "2023-11-01T10:10:00+00:00");
    }

    #[test]
    fn test_text_payload() {
        let ts = Utc.with_ymd_and_hms(2023, 11, 1, 10, 10, 0).unwrap();
        let event = TrackEvent::TextMessage {
            source: 226318000,
            destination: None,
            text: "SART TEST".into(),
            timestamp: ts,
        };
        let payload = event_payload(&ServiceEvent::Text(event)).unwrap();
        assert_eq!(payload["mmsi"], "226318000");
        assert!(payload["destination"].is_null());
        assert_eq!(payload["message"], "SART TEST");

        let other = TrackEvent::StaticUpdate {
            mmsi: 226318000,
            name: None,
            call_sign: None,
            timestamp: ts,
        };
        assert!(text_payload(&other).is_none());
    }
}
