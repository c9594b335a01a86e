use serde::Serialize;

use crate::{
    models::{
        column::{ColumnDescriptor, ColumnLayout, Renderer},
        grid::{SortDir, SortSpec},
    },
    services::grid_adapter::GridMethod,
};

/// A listing page of the dashboard.
#[derive(Debug)]
pub struct GridPage {
    pub slug: &'static str,
    pub title: &'static str,
    pub endpoint: &'static str,
    pub method: GridMethod,
    pub initial_sort: (&'static str, SortDir),
    pub columns: &'static [ColumnDescriptor],
}

impl GridPage {
    pub fn initial_sort(&self) -> SortSpec {
        SortSpec {
            field: self.initial_sort.0.to_string(),
            dir: self.initial_sort.1,
        }
    }

    pub fn config(&self) -> PageConfig {
        PageConfig {
            slug: self.slug,
            title: self.title,
            method: self.method,
            initial_sort: vec![self.initial_sort()],
            columns: self.columns.iter().map(ColumnDescriptor::layout).collect(),
        }
    }
}

/// Page configuration as sent to the browser.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub slug: &'static str,
    pub title: &'static str,
    pub method: GridMethod,
    pub initial_sort: Vec<SortSpec>,
    pub columns: Vec<ColumnLayout>,
}

const AUDIT_COLUMNS: [ColumnDescriptor; 4] = [
    ColumnDescriptor::new("Insert By", "insert_by"),
    ColumnDescriptor::new("Insert Date", "insert_date"),
    ColumnDescriptor::new("Update By", "update_by"),
    ColumnDescriptor::new("Update Date", "update_date"),
];

const CUSTOMER_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("Customer ID", "customer_id"),
    ColumnDescriptor::new("Customer Name", "customer_name"),
    ColumnDescriptor::new("PIC", "pic"),
    ColumnDescriptor::new("Email", "email"),
    ColumnDescriptor::new("Contact", "contact"),
    ColumnDescriptor::new("Address", "address"),
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
];

const HEAD_UNIT_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("Head ID", "head_id"),
    ColumnDescriptor::new("Description", "description"),
    ColumnDescriptor::new("License Plate", "license_plate"),
    ColumnDescriptor::new("STNK Expiry", "stnk_expiry"),
    ColumnDescriptor::new("Liter Full", "liter_full"),
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
];

const TAIL_UNIT_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("Tail ID", "tail_id"),
    ColumnDescriptor::new("Description", "description"),
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
];

const ROUTE_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("Route ID", "route_id"),
    ColumnDescriptor::new("Description", "description"),
    ColumnDescriptor::new("From", "from_x"),
    ColumnDescriptor::new("To", "to_x"),
    ColumnDescriptor::new("Distance", "distance"),
    ColumnDescriptor::new("Est Dur", "est_dur"),
    ColumnDescriptor::new("Toll", "toll"),
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
];

const PAYMENT_TERM_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("Term ID", "term_id"),
    ColumnDescriptor::new("Term Code", "term_code"),
    ColumnDescriptor::new("Description", "description"),
    ColumnDescriptor::new("Due Days", "due_days"),
    ColumnDescriptor::new("Is Prepaid", "is_prepaid"),
    ColumnDescriptor::new("Discount Percent", "discount_percent"),
    ColumnDescriptor::new("Discount Days", "discount_days"),
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
];

const ORDER_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("Order ID", "order_id")
        .renderer(Renderer::Link { href: "/operation/order/{value}" }),
    ColumnDescriptor::new("Date", "date"),
    ColumnDescriptor::new("No of Containers", "no_of_containers"),
    ColumnDescriptor::new("Customer ID", "customer_id"),
    ColumnDescriptor::new("Customer Name", "customer_name"),
    ColumnDescriptor::new("Contact name", "contact_name"),
    ColumnDescriptor::new("General Notes", "general_notes"),
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
];

/// Every listing page, in menu order.
pub static PAGES: &[GridPage] = &[
    GridPage {
        slug: "customers",
        title: "Customers",
        endpoint: "/api/master-data/customer/master-customer/",
        method: GridMethod::Post,
        initial_sort: ("customer_id", SortDir::Asc),
        columns: CUSTOMER_COLUMNS,
    },
    GridPage {
        slug: "head-units",
        title: "Head Units",
        endpoint: "/api/master-data/head/master-head/",
        method: GridMethod::Post,
        initial_sort: ("head_id", SortDir::Asc),
        columns: HEAD_UNIT_COLUMNS,
    },
    GridPage {
        slug: "tail-units",
        title: "Tail Units",
        endpoint: "/api/master-data/tail/master-tail/",
        method: GridMethod::Post,
        initial_sort: ("tail_id", SortDir::Asc),
        columns: TAIL_UNIT_COLUMNS,
    },
    GridPage {
        slug: "routes",
        title: "Routes",
        endpoint: "/api/master-data/route/master-route/",
        method: GridMethod::Post,
        initial_sort: ("route_id", SortDir::Asc),
        columns: ROUTE_COLUMNS,
    },
    GridPage {
        slug: "payment-terms",
        title: "Payment Terms",
        endpoint: "/api/master-data/payment-terms/master-payment-terms/",
        method: GridMethod::Post,
        initial_sort: ("term_id", SortDir::Asc),
        columns: PAYMENT_TERM_COLUMNS,
    },
    GridPage {
        slug: "orders",
        title: "Orders",
        endpoint: "/api/transactional/order/customer-order-header/",
        method: GridMethod::Post,
        initial_sort: ("order_id", SortDir::Asc),
        columns: ORDER_COLUMNS,
    },
];

pub fn find(slug: &str) -> Option<&'static GridPage> {
    PAGES.iter().find(|page| page.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slugs_are_unique() {
        let slugs: HashSet<_> = PAGES.iter().map(|page| page.slug).collect();
        assert_eq!(slugs.len(), PAGES.len());
    }

    #[test]
    fn initial_sort_column_exists_on_every_page() {
        for page in PAGES {
            assert!(
                page.columns.iter().any(|c| c.field == page.initial_sort.0),
                "{} sorts by a missing column",
                page.slug
            );
        }
    }

    #[test]
    fn order_id_links_to_detail() {
        let orders = find("orders").unwrap();
        let layout = orders.config();
        assert_eq!(
            layout.columns[0].renderer.unwrap().href_for("ORD-1"),
            "/operation/order/ORD-1"
        );
        assert_eq!(layout.columns[2].min_width, 160);
    }

    #[test]
    fn unknown_slug_is_none() {
        assert!(find("drivers").is_none());
    }
}
