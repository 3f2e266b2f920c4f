use crate::errors::{DatatableError, Result};
use serde::{Deserialize, Serialize};

/// How free-text search may target a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Searchable {
    /// Never searched, even when the client sends a column-specific term
    None,
    /// Case-insensitive substring match
    #[default]
    Normal,
    /// Regular expression match
    Regex,
}

impl Searchable {
    #[must_use]
    pub const fn is_searchable(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Whether a column may be used as a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orderable {
    None,
    #[default]
    AscDesc,
}

impl Orderable {
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(self, Self::AscDesc)
    }
}

/// Server-declared capabilities of a single table column.
///
/// The name must match the field name of the underlying data source. The
/// capabilities are authoritative: a client asking to sort or search a column
/// cannot override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColumnConfigurationBuilder")]
pub struct ColumnConfiguration {
    name: String,
    searchable: Searchable,
    orderable: Orderable,
}

impl ColumnConfiguration {
    #[must_use]
    pub fn builder() -> ColumnConfigurationBuilder {
        ColumnConfigurationBuilder::new()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn searchable(&self) -> Searchable {
        self.searchable
    }

    #[must_use]
    pub const fn orderable(&self) -> Orderable {
        self.orderable
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColumnConfigurationBuilder {
    name: Option<String>,
    searchable: Searchable,
    orderable: Orderable,
}

impl ColumnConfigurationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn searchable(mut self, searchable: Searchable) -> Self {
        self.searchable = searchable;
        self
    }

    #[must_use]
    pub fn orderable(mut self, orderable: Orderable) -> Self {
        self.orderable = orderable;
        self
    }

    /// Freeze the column definition.
    ///
    /// # Errors
    ///
    /// Returns [`DatatableError::Configuration`] when no name, or a blank one, was set.
    pub fn build(self) -> Result<ColumnConfiguration> {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(DatatableError::configuration("column name is required")),
        };

        Ok(ColumnConfiguration {
            name,
            searchable: self.searchable,
            orderable: self.orderable,
        })
    }
}

impl TryFrom<ColumnConfigurationBuilder> for ColumnConfiguration {
    type Error = DatatableError;

    fn try_from(builder: ColumnConfigurationBuilder) -> Result<Self> {
        builder.build()
    }
}

/// Find a configured column by name.
pub(crate) fn find_column<'a>(
    columns: &'a [ColumnConfiguration],
    name: &str,
) -> Option<&'a ColumnConfiguration> {
    columns.iter().find(|column| column.name() == name)
}
