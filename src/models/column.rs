use serde::Serialize;

/// Narrowest a column may render, in widget units.
pub const MIN_COLUMN_WIDTH: u32 = 100;
/// Width budgeted per character of the column title.
pub const WIDTH_PER_TITLE_CHAR: u32 = 10;

/// How a cell value is displayed beyond plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Renderer {
    /// A link whose `{value}` placeholder is replaced by the cell value.
    Link { href: &'static str },
}

impl Renderer {
    /// Resolves the link target for a cell.
    pub fn href_for(&self, value: &str) -> String {
        match self {
            Renderer::Link { href } => href.replace("{value}", value),
        }
    }
}

/// Static column declaration owned by a grid page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub title: &'static str,
    pub field: &'static str,
    pub sortable: bool,
    pub filterable: bool,
    pub width: Option<u32>,
    pub renderer: Option<Renderer>,
}

impl ColumnDescriptor {
    /// A sortable column with a text header filter, the default for every
    /// listing page.
    pub const fn new(title: &'static str, field: &'static str) -> Self {
        Self {
            title,
            field,
            sortable: true,
            filterable: true,
            width: None,
            renderer: None,
        }
    }

    pub const fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub const fn renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Minimum width proportional to the title so headers never collapse.
    pub fn min_width(&self) -> u32 {
        let title_chars = self.title.chars().count() as u32;
        title_chars
            .saturating_mul(WIDTH_PER_TITLE_CHAR)
            .max(MIN_COLUMN_WIDTH)
    }

    pub fn layout(&self) -> ColumnLayout {
        ColumnLayout {
            title: self.title,
            field: self.field,
            header_sort: self.sortable,
            header_filter: self.filterable,
            min_width: self.min_width(),
            width: self.width,
            renderer: self.renderer,
        }
    }
}

/// Column configuration as handed to the widget. An explicit `width` wins
/// over `min_width`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub title: &'static str,
    pub field: &'static str,
    pub header_sort: bool,
    pub header_filter: bool,
    pub min_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<Renderer>,
}

impl ColumnLayout {
    /// The width the widget will actually use for this column.
    pub fn effective_width(&self) -> u32 {
        self.width.unwrap_or(self.min_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_title_is_floored() {
        let column = ColumnDescriptor::new("Toll", "toll");
        assert_eq!(column.min_width(), 100);
    }

    #[test]
    fn long_title_scales_with_length() {
        let column = ColumnDescriptor::new("Discount Percent Day", "discount");
        assert_eq!(column.title.len(), 20);
        assert_eq!(column.min_width(), 200);
    }

    #[test]
    fn explicit_width_overrides_minimum() {
        let layout = ColumnDescriptor::new("No of Containers", "no_of_containers")
            .width(90)
            .layout();
        assert_eq!(layout.min_width, 160);
        assert_eq!(layout.effective_width(), 90);

        let auto = ColumnDescriptor::new("No of Containers", "no_of_containers").layout();
        assert_eq!(auto.effective_width(), 160);
    }

    #[test]
    fn link_renderer_fills_placeholder() {
        let renderer = Renderer::Link { href: "/operation/order/{value}" };
        assert_eq!(renderer.href_for("ORD-7"), "/operation/order/ORD-7");
    }

    #[test]
    fn layout_omits_unset_width() {
        let value = serde_json::to_value(ColumnDescriptor::new("PIC", "pic").layout()).unwrap();
        assert_eq!(value["minWidth"], 100);
        assert!(value.get("width").is_none());
        assert_eq!(value["headerSort"], true);
    }
}
