use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    error::ApiError,
    models::grid::{GridEnvelope, GridRequest, GridRow},
    services::{
        api_client::{ApiClient, Payload},
        grid_response::{self, PageCountPolicy},
    },
};

/// Record field marking a soft-deleted row.
pub const SOFT_DELETE_FIELD: &str = "deleted";

/// Names the grid parameters are sent under. The same for every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireParamNames {
    pub page: &'static str,
    pub size: &'static str,
    pub sort: &'static str,
    pub filter: &'static str,
}

impl Default for WireParamNames {
    fn default() -> Self {
        Self {
            page: "page",
            size: "pageSize",
            sort: "sort",
            filter: "filter",
        }
    }
}

/// Transport of the grid parameters, chosen per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GridMethod {
    /// Parameters in the query string.
    Get,
    /// Parameters in the JSON body.
    Post,
}

impl GridMethod {
    pub fn as_method(&self) -> Method {
        match self {
            GridMethod::Get => Method::GET,
            GridMethod::Post => Method::POST,
        }
    }
}

/// Binds a remote-paginated grid to one upstream listing endpoint.
///
/// The adapter is stateless: every `fetch_page` is an independent,
/// idempotent read. Ordering of overlapping fetches is left to `GridView`.
#[derive(Debug, Clone)]
pub struct GridAdapter {
    endpoint: String,
    method: GridMethod,
    params: WireParamNames,
    policy: PageCountPolicy,
}

impl GridAdapter {
    pub fn new(endpoint: impl Into<String>, method: GridMethod, policy: PageCountPolicy) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            params: WireParamNames::default(),
            policy,
        }
    }

    pub fn with_params(mut self, params: WireParamNames) -> Self {
        self.params = params;
        self
    }

    /// Fetches one page and normalizes it for the widget.
    ///
    /// Empty results are a normal page. Client errors are returned as they
    /// are so the widget shows its own error state.
    pub async fn fetch_page(
        &self,
        client: &ApiClient,
        request: GridRequest,
    ) -> Result<GridEnvelope, ApiError> {
        let request = request.clamped();
        let payload = self.payload(&request);

        tracing::debug!(
            "📄 Fetching {} page={} size={} sort={} filter={}",
            self.endpoint,
            request.page,
            request.page_size,
            request.sort.len(),
            request.filter.len()
        );

        let response = client
            .request(self.method.as_method(), &self.endpoint, &payload)
            .await?;

        let page = grid_response::normalize(&response, self.policy, request.page_size);

        let mut records = page.records;
        if records.len() as u64 > request.page_size {
            tracing::warn!(
                "⚠️ {} returned {} rows for a page of {}, truncating",
                self.endpoint,
                records.len(),
                request.page_size
            );
            records.truncate(request.page_size as usize);
        }

        Ok(GridEnvelope {
            rows: records.into_iter().map(decorate).collect(),
            total_pages: page.total_pages,
            total_count: page.total_count,
        })
    }

    /// Maps the request onto the wire names and the configured transport.
    pub fn payload(&self, request: &GridRequest) -> Payload {
        match self.method {
            GridMethod::Post => Payload::Json(self.body(request)),
            GridMethod::Get => Payload::Query(self.query(request)),
        }
    }

    fn body(&self, request: &GridRequest) -> Value {
        let mut body = Map::new();
        body.insert(self.params.page.to_string(), Value::from(request.page));
        body.insert(self.params.size.to_string(), Value::from(request.page_size));
        body.insert(self.params.sort.to_string(), to_json(&request.sort));
        body.insert(self.params.filter.to_string(), to_json(&request.filter));
        Value::Object(body)
    }

    fn query(&self, request: &GridRequest) -> Vec<(String, String)> {
        let mut query = vec![
            (self.params.page.to_string(), request.page.to_string()),
            (self.params.size.to_string(), request.page_size.to_string()),
        ];
        if !request.sort.is_empty() {
            query.push((self.params.sort.to_string(), to_json(&request.sort).to_string()));
        }
        if !request.filter.is_empty() {
            query.push((self.params.filter.to_string(), to_json(&request.filter).to_string()));
        }
        query
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Array(Vec::new()))
}

/// Flags soft-deleted records for muted rendering; nothing is dropped.
pub fn decorate(record: Value) -> GridRow {
    let muted = record.get(SOFT_DELETE_FIELD).is_some_and(is_truthy);
    GridRow { record, muted }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false")
        }
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grid::{FilterSpec, Predicate, SortSpec};
    use serde_json::json;

    fn request() -> GridRequest {
        GridRequest::default()
            .page(2)
            .page_size(25)
            .sort_by(SortSpec::asc("route_id"))
            .sort_by(SortSpec::desc("distance"))
            .filter(FilterSpec::new().with("description", Predicate::like("jakarta")))
    }

    #[test]
    fn post_sends_wire_names_in_body() {
        let adapter = GridAdapter::new("/api/x/", GridMethod::Post, PageCountPolicy::FixedDivisor(100));

        let Payload::Json(body) = adapter.payload(&request()) else {
            panic!("POST grids must send a JSON body");
        };

        assert_eq!(body["page"], 2);
        assert_eq!(body["pageSize"], 25);
        assert_eq!(
            body["sort"],
            json!([{"field": "route_id", "dir": "asc"}, {"field": "distance", "dir": "desc"}])
        );
        assert_eq!(
            body["filter"],
            json!([{"field": "description", "type": "like", "value": "jakarta"}])
        );
    }

    #[test]
    fn get_sends_query_string() {
        let adapter = GridAdapter::new("/api/x/", GridMethod::Get, PageCountPolicy::FixedDivisor(100));

        let Payload::Query(query) = adapter.payload(&request()) else {
            panic!("GET grids must send a query string");
        };

        assert_eq!(query[0], ("page".to_string(), "2".to_string()));
        assert_eq!(query[1], ("pageSize".to_string(), "25".to_string()));
        assert_eq!(query[2].0, "sort");
        let sort: Value = serde_json::from_str(&query[2].1).unwrap();
        assert_eq!(sort[1]["field"], "distance");
        assert_eq!(query[3].0, "filter");
    }

    #[test]
    fn get_omits_empty_sort_and_filter() {
        let adapter = GridAdapter::new("/api/x/", GridMethod::Get, PageCountPolicy::FixedDivisor(100));
        let Payload::Query(query) = adapter.payload(&GridRequest::default()) else {
            panic!("GET grids must send a query string");
        };
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn custom_wire_names_are_used() {
        let adapter = GridAdapter::new("/api/x/", GridMethod::Post, PageCountPolicy::FixedDivisor(100))
            .with_params(WireParamNames {
                page: "pageNumber",
                size: "limit",
                sort: "order",
                filter: "where",
            });
        let Payload::Json(body) = adapter.payload(&GridRequest::default()) else {
            panic!("POST grids must send a JSON body");
        };
        assert_eq!(body["pageNumber"], 1);
        assert_eq!(body["limit"], 100);
        assert!(body.get("page").is_none());
    }

    #[test]
    fn deleted_rows_are_muted_not_removed() {
        let deleted = decorate(json!({"id": 1, "deleted": true}));
        let live = decorate(json!({"id": 2, "deleted": false}));
        let plain = decorate(json!({"id": 3}));

        assert!(deleted.muted);
        assert_eq!(deleted.record["id"], 1);
        assert!(!live.muted);
        assert!(!plain.muted);
    }

    #[test]
    fn truthiness_follows_loose_flags() {
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("Y")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }
}
