//! Document fixtures shaped like the search cluster's `_source` bodies.

use serde_json::{Value, json};

/// nginx access document with every access-log field present (flattened keys).
pub fn access_doc(timestamp: &str, path: &str) -> Value {
    json!({
        "@timestamp": timestamp,
        "nginx.referrer": "https://example.com/",
        "nginx.path": path,
        "nginx.remote": "10.0.0.7",
        "nginx.request_length": 512,
        "nginx.upstream_status": "200",
        "nginx.request_time": 0.042,
        "nginx.upstream_response_length": 1024,
    })
}

/// Same fields as [`access_doc`] but nested under an `nginx` object.
pub fn nested_access_doc(timestamp: &str, path: &str) -> Value {
    json!({
        "@timestamp": timestamp,
        "nginx": {
            "referrer": "https://example.com/",
            "path": path,
            "remote": "10.0.0.7",
            "request_length": 512,
            "upstream_status": "200",
            "request_time": 0.042,
            "upstream_response_length": 1024,
        }
    })
}

pub fn message_doc(timestamp: &str, message: &str) -> Value {
    json!({ "@timestamp": timestamp, "message": message })
}

/// Nine well-formed message documents one minute apart starting at
/// 2024-11-01T07:00:00Z (10:00 in Istanbul).
pub fn nine_messages() -> Vec<Value> {
    (0..9)
        .map(|i| message_doc(&format!("2024-11-01T07:{i:02}:00Z"), &format!("msg {i}")))
        .collect()
}

/// Read a CSV file into rows of fields.
pub fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("open csv");
    reader
        .records()
        .map(|r| r.expect("csv record").iter().map(str::to_string).collect())
        .collect()
}
