//! Provider-compatibility shims.
//!
//! The image-to-3D service has shipped several response shapes over time
//! (flat fields, a `result` wrapper, a `data` envelope). Each field we
//! need is read through an ordered list of JSON pointers; the first
//! non-empty match wins. New shapes are supported by extending a list,
//! never by adding inline conditionals at the call site.

use fieldmesh_core::model_status::RemoteStatus;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Extractor lists
// ---------------------------------------------------------------------------

/// Where the accept response carries the new task id, in priority order.
pub const TASK_ID_POINTERS: &[&str] = &["/result", "/id", "/task_id", "/data/id", "/data/task_id"];

/// Where a status response carries the status string.
pub const STATUS_POINTERS: &[&str] = &["/status", "/state", "/data/status"];

/// Preferred asset formats, best first.
pub const MODEL_FORMAT_PRECEDENCE: &[&str] = &["glb", "fbx", "obj", "usdz"];

/// Objects keyed by asset format.
pub const MODEL_URL_CONTAINERS: &[&str] = &["/model_urls", "/result/model_urls", "/data/model_urls"];

/// Single-URL fields used when no per-format object is present.
pub const FLAT_MODEL_URL_POINTERS: &[&str] = &["/model_url", "/result/model_url", "/data/model_url"];

/// Preview image fields.
pub const PREVIEW_URL_POINTERS: &[&str] = &[
    "/thumbnail_url",
    "/preview_url",
    "/result/thumbnail_url",
    "/data/thumbnail_url",
];

/// Failure reason fields.
pub const FAILURE_REASON_POINTERS: &[&str] = &[
    "/task_error/message",
    "/error/message",
    "/error",
    "/message",
];

// ---------------------------------------------------------------------------
// Status synonyms
// ---------------------------------------------------------------------------

const READY_SYNONYMS: &[&str] = &["succeeded", "completed", "success", "done", "finished"];
const FAILED_SYNONYMS: &[&str] = &["failed", "error", "errored", "expired", "canceled", "cancelled"];
const PROCESSING_SYNONYMS: &[&str] = &["processing", "in_progress", "running", "started"];
const QUEUED_SYNONYMS: &[&str] = &["queued", "pending", "waiting"];

/// Map a raw status string onto [`RemoteStatus`].
///
/// Case-insensitive; spaces and dashes count as underscores. Anything
/// unrecognized is [`RemoteStatus::Unknown`].
pub fn normalize_status(raw: &str) -> RemoteStatus {
    let key = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    let key = key.as_str();

    if READY_SYNONYMS.contains(&key) {
        RemoteStatus::Ready
    } else if FAILED_SYNONYMS.contains(&key) {
        RemoteStatus::Failed
    } else if PROCESSING_SYNONYMS.contains(&key) {
        RemoteStatus::Processing
    } else if QUEUED_SYNONYMS.contains(&key) {
        RemoteStatus::Queued
    } else {
        RemoteStatus::Unknown
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// First non-empty string found under `pointers`.
fn first_string(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| match value.pointer(p) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Task id from a submit response. Numeric ids are accepted as text.
pub fn extract_task_id(value: &Value) -> Option<String> {
    TASK_ID_POINTERS.iter().find_map(|p| match value.pointer(p) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Raw status string from a status response.
pub fn extract_status(value: &Value) -> Option<String> {
    first_string(value, STATUS_POINTERS)
}

/// Primary asset URL, honouring [`MODEL_FORMAT_PRECEDENCE`] across every
/// container before falling back to flat fields.
pub fn extract_model_url(value: &Value) -> Option<String> {
    MODEL_FORMAT_PRECEDENCE
        .iter()
        .find_map(|format| {
            let pointers: Vec<String> = MODEL_URL_CONTAINERS
                .iter()
                .map(|container| format!("{container}/{format}"))
                .collect();
            let pointers: Vec<&str> = pointers.iter().map(String::as_str).collect();
            first_string(value, &pointers)
        })
        .or_else(|| first_string(value, FLAT_MODEL_URL_POINTERS))
}

/// Optional preview image URL.
pub fn extract_preview_url(value: &Value) -> Option<String> {
    first_string(value, PREVIEW_URL_POINTERS)
}

/// Upstream-provided failure reason, if any.
pub fn extract_failure_reason(value: &Value) -> Option<String> {
    first_string(value, FAILURE_REASON_POINTERS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- normalize_status -----------------------------------------------------

    #[test]
    fn ready_synonyms_any_case() {
        for raw in ["Succeeded", "completed", "SUCCESS", " done "] {
            assert_eq!(normalize_status(raw), RemoteStatus::Ready, "{raw}");
        }
    }

    #[test]
    fn failed_synonyms_any_case() {
        for raw in ["failed", "Error", "EXPIRED", "canceled"] {
            assert_eq!(normalize_status(raw), RemoteStatus::Failed, "{raw}");
        }
    }

    #[test]
    fn in_flight_synonyms() {
        assert_eq!(normalize_status("queued"), RemoteStatus::Queued);
        assert_eq!(normalize_status("PENDING"), RemoteStatus::Queued);
        assert_eq!(normalize_status("processing"), RemoteStatus::Processing);
        assert_eq!(normalize_status("In Progress"), RemoteStatus::Processing);
        assert_eq!(normalize_status("in-progress"), RemoteStatus::Processing);
    }

    #[test]
    fn unrecognized_status_is_unknown() {
        assert_eq!(normalize_status("baking"), RemoteStatus::Unknown);
        assert_eq!(normalize_status(""), RemoteStatus::Unknown);
    }

    // -- task id --------------------------------------------------------------

    #[test]
    fn task_id_prefers_result_field() {
        let body = json!({ "result": "T-result", "id": "T-id" });
        assert_eq!(extract_task_id(&body).as_deref(), Some("T-result"));
    }

    #[test]
    fn task_id_falls_back_through_list() {
        assert_eq!(
            extract_task_id(&json!({ "task_id": "T3" })).as_deref(),
            Some("T3")
        );
        assert_eq!(
            extract_task_id(&json!({ "data": { "id": "T4" } })).as_deref(),
            Some("T4")
        );
        assert_eq!(extract_task_id(&json!({ "id": 42 })).as_deref(), Some("42"));
    }

    #[test]
    fn task_id_skips_blank_and_non_string_fields() {
        let body = json!({ "result": { "nested": true }, "id": "  ", "task_id": "T5" });
        assert_eq!(extract_task_id(&body).as_deref(), Some("T5"));
        assert_eq!(extract_task_id(&json!({ "ok": true })), None);
    }

    // -- assets ---------------------------------------------------------------

    #[test]
    fn primary_format_wins_over_secondary() {
        let body = json!({
            "model_urls": { "fbx": "https://x/model.fbx", "glb": "https://x/model.glb" }
        });
        assert_eq!(
            extract_model_url(&body).as_deref(),
            Some("https://x/model.glb")
        );
    }

    #[test]
    fn format_precedence_spans_containers() {
        let body = json!({
            "model_urls": { "obj": "https://x/model.obj" },
            "result": { "model_urls": { "fbx": "https://x/model.fbx" } }
        });
        assert_eq!(
            extract_model_url(&body).as_deref(),
            Some("https://x/model.fbx")
        );
    }

    #[test]
    fn flat_model_url_is_last_resort() {
        let body = json!({ "model_url": "https://x/flat.glb" });
        assert_eq!(extract_model_url(&body).as_deref(), Some("https://x/flat.glb"));
        assert_eq!(extract_model_url(&json!({ "model_urls": {} })), None);
    }

    #[test]
    fn preview_url_from_alternate_fields() {
        assert_eq!(
            extract_preview_url(&json!({ "thumbnail_url": "https://x/t.png" })).as_deref(),
            Some("https://x/t.png")
        );
        assert_eq!(
            extract_preview_url(&json!({ "preview_url": "https://x/p.png" })).as_deref(),
            Some("https://x/p.png")
        );
        assert_eq!(extract_preview_url(&json!({})), None);
    }

    // -- failure reason -------------------------------------------------------

    #[test]
    fn failure_reason_prefers_task_error_message() {
        let body = json!({
            "task_error": { "message": "Image has no detectable terrain" },
            "message": "generic"
        });
        assert_eq!(
            extract_failure_reason(&body).as_deref(),
            Some("Image has no detectable terrain")
        );
    }

    #[test]
    fn failure_reason_accepts_plain_error_string() {
        let body = json!({ "error": "quota exceeded" });
        assert_eq!(extract_failure_reason(&body).as_deref(), Some("quota exceeded"));
        let body = json!({ "task_error": { "message": "" } });
        assert_eq!(extract_failure_reason(&body), None);
    }

    #[test]
    fn status_read_from_alternate_fields() {
        assert_eq!(
            extract_status(&json!({ "state": "RUNNING" })).as_deref(),
            Some("RUNNING")
        );
        assert_eq!(
            extract_status(&json!({ "data": { "status": "queued" } })).as_deref(),
            Some("queued")
        );
    }
}
