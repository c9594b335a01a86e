use crate::{
    catalog::GridPage,
    error::{AppError, Result},
    models::grid::GridRequest,
};

/// Largest page the dashboard will ask the upstream for.
pub const MAX_PAGE_SIZE: u64 = 1000;
/// Longest grid instance id a browser may send.
pub const MAX_GRID_ID_LEN: usize = 64;

/// Checks a grid request against the page it targets: the page size is
/// bounded, and only sortable/filterable columns of that page may be sorted
/// or filtered on.
pub fn validate_grid_request(page: &GridPage, request: &GridRequest) -> Result<()> {
    if request.page_size > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "pageSize must be at most {}",
            MAX_PAGE_SIZE
        )));
    }

    if let Some(grid_id) = &request.grid_id {
        let well_formed = !grid_id.is_empty()
            && grid_id.len() <= MAX_GRID_ID_LEN
            && grid_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(AppError::Validation("Invalid gridId".to_string()));
        }
    }

    for sort in &request.sort {
        let sortable = page
            .columns
            .iter()
            .any(|column| column.field == sort.field && column.sortable);
        if !sortable {
            return Err(AppError::Validation(format!(
                "Cannot sort {} by {}",
                page.slug, sort.field
            )));
        }
    }

    for (field, _) in request.filter.iter() {
        let filterable = page
            .columns
            .iter()
            .any(|column| column.field == field.as_str() && column.filterable);
        if !filterable {
            return Err(AppError::Validation(format!(
                "Cannot filter {} by {}",
                page.slug, field
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::models::grid::{FilterSpec, Predicate, SortSpec};

    #[test]
    fn accepts_known_columns() {
        let page = catalog::find("routes").unwrap();
        let request = GridRequest::default()
            .sort_by(SortSpec::desc("distance"))
            .filter(FilterSpec::new().with("from_x", Predicate::like("SBY")));
        assert!(validate_grid_request(page, &request).is_ok());
    }

    #[test]
    fn rejects_unknown_columns() {
        let page = catalog::find("routes").unwrap();
        let sort = GridRequest::default().sort_by(SortSpec::asc("password"));
        let filter = GridRequest::default()
            .filter(FilterSpec::new().with("1=1", Predicate::like("x")));
        assert!(validate_grid_request(page, &sort).is_err());
        assert!(validate_grid_request(page, &filter).is_err());
    }

    #[test]
    fn grid_ids_are_short_tokens() {
        let page = catalog::find("orders").unwrap();
        let ok = GridRequest::default().grid_id("tab_1-a");
        let empty = GridRequest::default().grid_id("");
        let long = GridRequest::default().grid_id("x".repeat(MAX_GRID_ID_LEN + 1));
        let odd = GridRequest::default().grid_id("a/b");
        assert!(validate_grid_request(page, &ok).is_ok());
        assert!(validate_grid_request(page, &empty).is_err());
        assert!(validate_grid_request(page, &long).is_err());
        assert!(validate_grid_request(page, &odd).is_err());
    }

    #[test]
    fn rejects_oversized_pages() {
        let page = catalog::find("orders").unwrap();
        let request = GridRequest::default().page_size(MAX_PAGE_SIZE + 1);
        assert!(validate_grid_request(page, &request).is_err());
    }
}
