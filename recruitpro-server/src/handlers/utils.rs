use recruitpro_db::job_records::JobRecordRow;
use serde_json::{json, Value};

use crate::error::ApiError;

pub fn parse_positive_usize(
    raw: Option<&String>,
    fallback: usize,
    field: &str,
) -> Result<usize, ApiError> {
    match raw {
        Some(value) => {
            let parsed = value.parse::<usize>().map_err(|_| {
                ApiError::bad_request(format!("{field} must be a positive integer"))
            })?;
            if parsed == 0 {
                return Err(ApiError::bad_request(format!("{field} must be at least 1")));
            }
            Ok(parsed)
        }
        None => Ok(fallback),
    }
}

/// Render a job record row as an API payload, parsing the JSON text
/// columns back into structured values.
pub fn record_to_payload(row: &JobRecordRow) -> Value {
    json!({
        "id": row.id,
        "jobType": row.job_type,
        "status": row.status.to_string(),
        "payload": parse_json_text(&row.payload),
        "result": row.result.as_deref().map(parse_json_text),
        "error": row.error,
        "createdAt": row.created_at.to_rfc3339(),
        "updatedAt": row.updated_at.to_rfc3339(),
    })
}

fn parse_json_text(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
