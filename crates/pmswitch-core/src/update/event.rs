//! Updater event feed: names on the wire and normalized payloads.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PmsError, Result};

/// The three events pushed by the updater service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateEventKind {
    Available,
    Progress,
    Finished,
}

impl UpdateEventKind {
    pub const ALL: [UpdateEventKind; 3] = [
        UpdateEventKind::Available,
        UpdateEventKind::Progress,
        UpdateEventKind::Finished,
    ];

    /// Event name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "update-available",
            Self::Progress => "update-progress",
            Self::Finished => "update-finished",
        }
    }
}

impl std::fmt::Display for UpdateEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An updater event after payload normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    Available { version: String },
    Progress { downloaded: u64, content_length: u64 },
    Finished,
}

#[derive(Deserialize)]
struct ProgressPayload {
    downloaded: u64,
    #[serde(rename = "contentLength", alias = "content_length", default)]
    content_length: Option<u64>,
}

impl UpdateEvent {
    pub fn kind(&self) -> UpdateEventKind {
        match self {
            Self::Available { .. } => UpdateEventKind::Available,
            Self::Progress { .. } => UpdateEventKind::Progress,
            Self::Finished => UpdateEventKind::Finished,
        }
    }

    /// Normalizes a raw payload into an event.
    ///
    /// `update-available` is accepted both as a bare version string and as
    /// an object with a `version` field. A missing or null content length in
    /// `update-progress` is read as 0 (unknown).
    pub fn from_payload(kind: UpdateEventKind, payload: &Value) -> Result<Self> {
        match kind {
            UpdateEventKind::Available => {
                let version = match payload {
                    Value::String(version) => version.as_str(),
                    Value::Object(map) => map
                        .get("version")
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            PmsError::malformed_event(kind.as_str(), "missing string field 'version'")
                        })?,
                    other => {
                        return Err(PmsError::malformed_event(
                            kind.as_str(),
                            format!("expected string or object, got {}", other),
                        ));
                    }
                };
                let version = version.trim();
                if version.is_empty() {
                    return Err(PmsError::malformed_event(kind.as_str(), "empty version"));
                }
                Ok(Self::Available {
                    version: version.to_string(),
                })
            }
            UpdateEventKind::Progress => {
                let parsed = ProgressPayload::deserialize(payload)
                    .map_err(|e| PmsError::malformed_event(kind.as_str(), e.to_string()))?;
                Ok(Self::Progress {
                    downloaded: parsed.downloaded,
                    content_length: parsed.content_length.unwrap_or(0),
                })
            }
            UpdateEventKind::Finished => Ok(Self::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_available_accepts_bare_string() {
        let event = UpdateEvent::from_payload(UpdateEventKind::Available, &json!("2.3.0")).unwrap();
        assert_eq!(
            event,
            UpdateEvent::Available {
                version: "2.3.0".to_string()
            }
        );
    }

    #[test]
    fn test_available_accepts_object() {
        let event =
            UpdateEvent::from_payload(UpdateEventKind::Available, &json!({ "version": "2.3.0" }))
                .unwrap();
        assert_eq!(event.kind(), UpdateEventKind::Available);
        assert_eq!(
            event,
            UpdateEvent::Available {
                version: "2.3.0".to_string()
            }
        );
    }

    #[test]
    fn test_available_rejects_other_shapes() {
        for payload in [json!(42), json!({ "name": "2.3.0" }), json!(""), Value::Null] {
            let err = UpdateEvent::from_payload(UpdateEventKind::Available, &payload).unwrap_err();
            assert!(err.is_malformed_event(), "payload {payload} should be rejected");
        }
    }

    #[test]
    fn test_progress_payload() {
        let event = UpdateEvent::from_payload(
            UpdateEventKind::Progress,
            &json!({ "downloaded": 500, "contentLength": 1000 }),
        )
        .unwrap();
        assert_eq!(
            event,
            UpdateEvent::Progress {
                downloaded: 500,
                content_length: 1000
            }
        );
    }

    #[test]
    fn test_progress_unknown_length_is_zero() {
        let event = UpdateEvent::from_payload(
            UpdateEventKind::Progress,
            &json!({ "downloaded": 10, "contentLength": null }),
        )
        .unwrap();
        assert_eq!(
            event,
            UpdateEvent::Progress {
                downloaded: 10,
                content_length: 0
            }
        );
    }

    #[test]
    fn test_progress_rejects_negative_counts() {
        let err = UpdateEvent::from_payload(
            UpdateEventKind::Progress,
            &json!({ "downloaded": -1, "contentLength": 10 }),
        )
        .unwrap_err();
        assert!(err.is_malformed_event());
    }

    #[test]
    fn test_finished_ignores_payload() {
        let event = UpdateEvent::from_payload(UpdateEventKind::Finished, &Value::Null).unwrap();
        assert_eq!(event, UpdateEvent::Finished);
    }
}
