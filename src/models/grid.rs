use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rows per page when the widget does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Sort direction of one sorted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

/// One entry of a (possibly multi-column) sort, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub dir: SortDir,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), dir: SortDir::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), dir: SortDir::Desc }
    }
}

/// A header filter applied to a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Filter operator, `like` for the text header filters.
    #[serde(rename = "type", default = "default_predicate_kind")]
    pub kind: String,
    pub value: Value,
}

fn default_predicate_kind() -> String {
    "like".to_string()
}

impl Predicate {
    pub fn like(value: impl Into<Value>) -> Self {
        Self { kind: default_predicate_kind(), value: value.into() }
    }
}

/// Wire form of a filter entry: `{"field", "type", "value"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterItem {
    pub field: String,
    #[serde(flatten)]
    pub predicate: Predicate,
}

/// Mapping from field to predicate. Travels as the widget's array of
/// `{field, type, value}` objects; a field filtered twice keeps the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FilterItem>", into = "Vec<FilterItem>")]
pub struct FilterSpec(BTreeMap<String, Predicate>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, predicate: Predicate) {
        self.0.insert(field.into(), predicate);
    }

    pub fn with(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.insert(field, predicate);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Predicate> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Predicate)> {
        self.0.iter()
    }
}

impl From<Vec<FilterItem>> for FilterSpec {
    fn from(items: Vec<FilterItem>) -> Self {
        Self(items.into_iter().map(|item| (item.field, item.predicate)).collect())
    }
}

impl From<FilterSpec> for Vec<FilterItem> {
    fn from(spec: FilterSpec) -> Self {
        spec.0
            .into_iter()
            .map(|(field, predicate)| FilterItem { field, predicate })
            .collect()
    }
}

/// What the grid widget asks for on load, page change, page-size change,
/// sort change and filter change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRequest {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    #[serde(default)]
    pub filter: FilterSpec,
    /// Identifies the grid instance (one per browser tab) that asked. Never
    /// sent upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_id: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for GridRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            sort: Vec::new(),
            filter: FilterSpec::default(),
            grid_id: None,
        }
    }
}

impl GridRequest {
    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn sort_by(mut self, spec: SortSpec) -> Self {
        self.sort.push(spec);
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn grid_id(mut self, grid_id: impl Into<String>) -> Self {
        self.grid_id = Some(grid_id.into());
        self
    }

    /// Page and page size are positive integers.
    pub fn clamped(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = self.page_size.max(1);
        self
    }
}

/// A fetched record plus its visual treatment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub record: Value,
    /// Soft-deleted rows stay in the page but render struck through.
    pub muted: bool,
}

/// The normalized page handed back to the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridEnvelope {
    pub rows: Vec<GridRow>,
    pub total_pages: u64,
    pub total_count: u64,
}

impl GridEnvelope {
    pub fn empty() -> Self {
        Self { rows: Vec::new(), total_pages: 1, total_count: 0 }
    }
}
