use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::pagination::Pagination;

/// Status block carried by every response, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub code: u16,
    pub message: String,
    pub debug_param: String,
    pub server_time: String,
}

impl Meta {
    pub fn new(code: u16, message: impl Into<String>, debug_param: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            debug_param: debug_param.into(),
            server_time: server_time(Utc::now()),
        }
    }
}

/// RFC 1123 timestamp, e.g. `Mon, 02 Jan 2006 15:04:05 UTC`.
pub fn server_time(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S UTC").to_string()
}

/// `{ meta, pagination?, data }`. `pagination` is omitted unless given.
pub fn envelope(meta: &Meta, pagination: Option<&Pagination>, data: Value) -> Value {
    let mut body = json!({
        "meta": meta,
        "data": data,
    });
    if let Some(pagination) = pagination {
        body["pagination"] = json!(pagination);
    }
    body
}
