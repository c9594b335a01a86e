//! Normalization of the two response layouts the backend uses for listing
//! endpoints.
//!
//! Detection and mapping are separate pure functions: `ResponseShape::detect`
//! tags a payload, `ResponseShape::normalize` maps a tagged payload to a
//! `NormalizedPage`.

use serde_json::Value;

/// How `totalPages` is derived when the payload carries no `last_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCountPolicy {
    /// Divide by a fixed row count regardless of the requested page size.
    FixedDivisor(u64),
    /// Divide by the page size of the request.
    RequestedPageSize,
}

impl PageCountPolicy {
    pub fn divisor(&self, page_size: u64) -> u64 {
        match self {
            PageCountPolicy::FixedDivisor(n) => (*n).max(1),
            PageCountPolicy::RequestedPageSize => page_size.max(1),
        }
    }
}

/// The response layouts a listing endpoint may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"data": [...], "total_count"?, "last_page"?}`
    NestedData,
    /// `{"result": [...]?, "total"?, "last_page"?}`, also the fallback for
    /// anything else.
    LegacyResult,
}

/// Records and counters before row decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPage {
    pub records: Vec<Value>,
    pub total_pages: u64,
    pub total_count: u64,
}

impl ResponseShape {
    pub fn detect(payload: &Value) -> Self {
        if payload.get("data").is_some_and(Value::is_array) {
            ResponseShape::NestedData
        } else {
            ResponseShape::LegacyResult
        }
    }

    pub fn normalize(self, payload: &Value, policy: PageCountPolicy, page_size: u64) -> NormalizedPage {
        match self {
            ResponseShape::NestedData => {
                let records = array_field(payload, "data");
                let row_count = records.len() as u64;
                let total_count = positive_field(payload, "total_count");
                let total_pages = positive_field(payload, "last_page").unwrap_or_else(|| {
                    total_count
                        .unwrap_or(row_count)
                        .div_ceil(policy.divisor(page_size))
                });

                NormalizedPage {
                    records,
                    total_pages: total_pages.max(1),
                    total_count: total_count.unwrap_or(row_count),
                }
            }
            ResponseShape::LegacyResult => {
                let records = array_field(payload, "result");
                let total_count = positive_field(payload, "total")
                    .unwrap_or(records.len() as u64);

                NormalizedPage {
                    total_pages: positive_field(payload, "last_page").unwrap_or(1),
                    total_count,
                    records,
                }
            }
        }
    }
}

/// Detects the shape and normalizes in one go.
pub fn normalize(payload: &Value, policy: PageCountPolicy, page_size: u64) -> NormalizedPage {
    ResponseShape::detect(payload).normalize(payload, policy, page_size)
}

fn array_field(payload: &Value, field: &str) -> Vec<Value> {
    payload
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Reads a counter. Zero, negatives, null and garbage count as absent;
/// numeric strings are accepted.
fn positive_field(payload: &Value, field: &str) -> Option<u64> {
    let value = payload.get(field)?;
    let number = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f.ceil() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (number > 0).then_some(number)
}
