use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction of a single order clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// Parse a textual direction. Anything other than "asc" (any case) sorts descending.
    #[must_use]
    pub fn from_text(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(column, direction)` sort instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOrder {
    pub column: String,
    pub direction: OrderDirection,
}

/// Canonical, wire-format independent description of what a table request
/// asks for: pagination window, search terms and sort keys.
///
/// Column names in here have already been checked against the table's
/// column configuration by the parser that built it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QueryConfiguration {
    start: u64,
    length: Option<u64>,
    draw_call: Option<String>,
    search_value: Option<String>,
    search_regex: bool,
    search_columns: Vec<(String, String)>,
    order_columns: Vec<ColumnOrder>,
}

impl QueryConfiguration {
    #[must_use]
    pub fn builder() -> QueryConfigurationBuilder {
        QueryConfigurationBuilder::new()
    }

    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Maximum number of rows, `None` meaning all of them.
    #[must_use]
    pub const fn length(&self) -> Option<u64> {
        self.length
    }

    #[must_use]
    pub fn draw_call(&self) -> Option<&str> {
        self.draw_call.as_deref()
    }

    #[must_use]
    pub fn search_value(&self) -> Option<&str> {
        self.search_value.as_deref()
    }

    /// True when a non-empty global search term is set.
    #[must_use]
    pub fn is_global_search(&self) -> bool {
        self.search_value.as_deref().is_some_and(|value| !value.is_empty())
    }

    #[must_use]
    pub const fn is_global_regex(&self) -> bool {
        self.search_regex
    }

    /// Column specific search terms, in the order they were added.
    #[must_use]
    pub fn search_columns(&self) -> &[(String, String)] {
        &self.search_columns
    }

    #[must_use]
    pub fn column_search(&self, column: &str) -> Option<&str> {
        self.search_columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, term)| term.as_str())
    }

    #[must_use]
    pub fn is_column_search(&self) -> bool {
        !self.search_columns.is_empty()
    }

    /// True when either a global or a column specific search is active.
    #[must_use]
    pub fn has_search(&self) -> bool {
        self.is_global_search() || self.is_column_search()
    }

    /// Sort instructions; the first entry is the primary sort key.
    #[must_use]
    pub fn order_columns(&self) -> &[ColumnOrder] {
        &self.order_columns
    }

    #[must_use]
    pub fn has_order_columns(&self) -> bool {
        !self.order_columns.is_empty()
    }
}

/// Accumulates a [`QueryConfiguration`].
///
/// Setters overwrite, except [`column_order`](Self::column_order) which appends
/// so parsers can push sort keys in priority order. Nothing is validated here.
#[derive(Debug, Clone, Default)]
pub struct QueryConfigurationBuilder {
    inner: QueryConfiguration,
}

impl QueryConfigurationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn start(mut self, start: u64) -> Self {
        self.inner.start = start;
        self
    }

    #[must_use]
    pub fn length(mut self, length: u64) -> Self {
        self.inner.length = Some(length);
        self
    }

    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.inner.length = None;
        self
    }

    #[must_use]
    pub fn draw_call(mut self, draw_call: impl Into<String>) -> Self {
        self.inner.draw_call = Some(draw_call.into());
        self
    }

    #[must_use]
    pub fn search_value(mut self, value: impl Into<String>) -> Self {
        self.inner.search_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn search_regex(mut self, regex: bool) -> Self {
        self.inner.search_regex = regex;
        self
    }

    #[must_use]
    pub fn column_search(mut self, column: impl Into<String>, term: impl Into<String>) -> Self {
        let column = column.into();
        let term = term.into();
        match self.inner.search_columns.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = term,
            None => self.inner.search_columns.push((column, term)),
        }
        self
    }

    #[must_use]
    pub fn column_order(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.inner.order_columns.push(ColumnOrder {
            column: column.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> QueryConfiguration {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = QueryConfiguration::builder().build();
        assert_eq!(query.start(), 0);
        assert_eq!(query.length(), None);
        assert_eq!(query.draw_call(), None);
        assert!(!query.is_global_search());
        assert!(!query.is_global_regex());
        assert!(!query.is_column_search());
        assert!(!query.has_order_columns());
    }

    #[test]
    fn test_order_columns_keep_sequence_and_duplicates() {
        let query = QueryConfiguration::builder()
            .column_order("name", OrderDirection::Asc)
            .column_order("id", OrderDirection::Desc)
            .column_order("name", OrderDirection::Desc)
            .build();

        let pairs: Vec<(&str, OrderDirection)> = query
            .order_columns()
            .iter()
            .map(|order| (order.column.as_str(), order.direction))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("name", OrderDirection::Asc),
                ("id", OrderDirection::Desc),
                ("name", OrderDirection::Desc),
            ]
        );
    }

    #[test]
    fn test_scalar_setters_overwrite() {
        let query = QueryConfiguration::builder()
            .start(5)
            .start(10)
            .length(3)
            .length(25)
            .search_value("first")
            .search_value("second")
            .build();
        assert_eq!(query.start(), 10);
        assert_eq!(query.length(), Some(25));
        assert_eq!(query.search_value(), Some("second"));
    }

    #[test]
    fn test_column_search_overwrites_same_column() {
        let query = QueryConfiguration::builder()
            .column_search("id", "1")
            .column_search("name", "bob")
            .column_search("id", "2")
            .build();
        assert_eq!(query.search_columns().len(), 2);
        assert_eq!(query.column_search("id"), Some("2"));
        assert_eq!(query.column_search("name"), Some("bob"));
        assert_eq!(query.column_search("email"), None);
    }

    #[test]
    fn test_empty_search_value_is_not_global_search() {
        let query = QueryConfiguration::builder().search_value("").build();
        assert!(!query.is_global_search());
        assert!(!query.has_search());
    }

    #[test]
    fn test_unbounded_resets_length() {
        let query = QueryConfiguration::builder().length(10).unbounded().build();
        assert_eq!(query.length(), None);
    }

    #[test]
    fn test_direction_from_text() {
        assert_eq!(OrderDirection::from_text("asc"), OrderDirection::Asc);
        assert_eq!(OrderDirection::from_text("ASC"), OrderDirection::Asc);
        assert_eq!(OrderDirection::from_text("desc"), OrderDirection::Desc);
        assert_eq!(OrderDirection::from_text("sideways"), OrderDirection::Desc);
        assert_eq!(OrderDirection::Desc.to_string(), "desc");
    }
}
