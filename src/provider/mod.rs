//! # Query Execution
//!
//! [`QueryBuilderProvider`] applies a [`QueryConfiguration`] to a data source
//! exposed through the [`QueryBuilder`] trait and collects the rows and counts
//! a table widget needs.
//!
//! ## Processing Steps
//!
//! 1. Search: one disjunctive predicate per searchable column, using the
//!    column's own search term when the request has one, else the global term
//! 2. Filtered count (row count after search, before pagination)
//! 3. Ordering, in the order of the query's sort instructions
//! 4. Pagination (`skip`, and `limit` unless all rows were requested)
//! 5. Fetch, restricted to the configured columns
//! 6. Total count, without any search applied
//!
//! Counts go through a [`CountCache`] when one is attached. Search counts are
//! cached only for a plain global term: column searches and regex searches
//! always hit the source.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut provider = QueryBuilderProvider::new(EntityQueryBuilder::<person::Entity>::new(db));
//! provider.prepare_for_processing(query, columns)?;
//! let data = provider.process().await?;
//! ```

pub mod collection;
pub mod entity;

pub use collection::CollectionQueryBuilder;
pub use entity::EntityQueryBuilder;

use crate::cache::CountCache;
use crate::columns::{ColumnConfiguration, Searchable};
use crate::errors::{DatatableError, Result};
use crate::query::{OrderDirection, QueryConfiguration};
use async_trait::async_trait;
use sea_orm::DbErr;
use serde::Serialize;
use std::sync::Arc;

/// Comparison applied by a search predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOperator {
    /// Case-insensitive `LIKE` against a `%term%` pattern
    Like,
    /// Regular expression match against the raw term
    Regexp,
}

impl SearchOperator {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Regexp => "REGEXP",
        }
    }
}

/// A single `column <operator> pattern` disjunct of the search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    pub column: String,
    pub operator: SearchOperator,
    pub pattern: String,
}

impl SearchPredicate {
    /// Build the predicate for `term` on `column`.
    ///
    /// Regex columns, or a request with the global regex flag, match the raw
    /// term as a regular expression; everything else is a substring match.
    #[must_use]
    pub fn for_column(column: &ColumnConfiguration, term: &str, regex: bool) -> Self {
        if regex || column.searchable() == Searchable::Regex {
            Self {
                column: column.name().to_string(),
                operator: SearchOperator::Regexp,
                pattern: term.to_string(),
            }
        } else {
            Self {
                column: column.name().to_string(),
                operator: SearchOperator::Like,
                pattern: format!("%{term}%"),
            }
        }
    }
}

/// The data source contract.
///
/// Mutating calls only record what should happen; `count` and `fetch` execute
/// against the source. Clones are independent: the provider keeps an untouched
/// clone around for the unfiltered total.
#[async_trait]
pub trait QueryBuilder: Clone + Send + Sync {
    type Row: Send;

    /// Add a predicate to the disjunctive search filter.
    fn or_where(&mut self, predicate: SearchPredicate);

    /// Append a sort key; earlier calls take precedence.
    fn order_by(&mut self, column: &str, direction: OrderDirection);

    fn skip(&mut self, offset: u64);

    fn limit(&mut self, limit: u64);

    /// Count matching rows, ignoring `skip`/`limit`.
    async fn count(&self) -> Result<u64, DbErr>;

    /// Fetch matching rows, restricted to `columns`.
    async fn fetch(&self, columns: &[String]) -> Result<Vec<Self::Row>, DbErr>;
}

/// Rows of one page plus the counts a widget needs for its pager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseData<R> {
    data: Vec<R>,
    total_data_count: u64,
    filtered_data_count: u64,
}

impl<R> ResponseData<R> {
    #[must_use]
    pub fn new(data: Vec<R>, total_data_count: u64, filtered_data_count: u64) -> Self {
        Self {
            data,
            total_data_count,
            filtered_data_count,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[R] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<R> {
        self.data
    }

    /// All rows, ignoring the search filter.
    #[must_use]
    pub const fn total_data_count(&self) -> u64 {
        self.total_data_count
    }

    /// Rows matching the search filter, before pagination.
    #[must_use]
    pub const fn filtered_data_count(&self) -> u64 {
        self.filtered_data_count
    }
}

#[derive(Debug)]
enum ProviderState {
    Unprepared,
    Prepared {
        query: QueryConfiguration,
        columns: Vec<ColumnConfiguration>,
    },
}

/// Drives a [`QueryBuilder`] through the processing steps.
///
/// Two phases: [`prepare_for_processing`](Self::prepare_for_processing) binds
/// the query and columns exactly once, then [`process`](Self::process) runs it.
pub struct QueryBuilderProvider<Q: QueryBuilder> {
    builder: Q,
    cache: Option<Arc<dyn CountCache>>,
    state: ProviderState,
}

impl<Q: QueryBuilder> QueryBuilderProvider<Q> {
    #[must_use]
    pub fn new(builder: Q) -> Self {
        Self {
            builder,
            cache: None,
            state: ProviderState::Unprepared,
        }
    }

    /// Use `cache` for the total and per-search-term counts.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CountCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub const fn is_prepared(&self) -> bool {
        matches!(self.state, ProviderState::Prepared { .. })
    }

    /// Bind the query and the table's columns.
    ///
    /// # Errors
    ///
    /// Returns [`DatatableError::InvalidState`] if the provider was already prepared.
    pub fn prepare_for_processing(
        &mut self,
        query: QueryConfiguration,
        columns: Vec<ColumnConfiguration>,
    ) -> Result<()> {
        if self.is_prepared() {
            return Err(DatatableError::invalid_state(
                "prepare_for_processing() may only be called once",
            ));
        }
        self.state = ProviderState::Prepared { query, columns };
        Ok(())
    }

    /// Run the prepared query.
    ///
    /// # Errors
    ///
    /// Returns [`DatatableError::InvalidState`] when called before
    /// [`prepare_for_processing`](Self::prepare_for_processing), and
    /// [`DatatableError::QueryExecution`] when the data source fails.
    pub async fn process(&self) -> Result<ResponseData<Q::Row>> {
        let ProviderState::Prepared { query, columns } = &self.state else {
            return Err(DatatableError::invalid_state(
                "process() called before prepare_for_processing()",
            ));
        };

        let mut builder = self.builder.clone();

        let searching = apply_search(&mut builder, query, columns);
        let filtered_count = if searching {
            Some(self.filtered_count(&builder, query).await?)
        } else {
            None
        };

        for order in query.order_columns() {
            builder.order_by(&order.column, order.direction);
        }

        builder.skip(query.start());
        if let Some(length) = query.length() {
            builder.limit(length);
        }

        let names: Vec<String> = columns.iter().map(|column| column.name().to_string()).collect();
        let data = builder
            .fetch(&names)
            .await
            .map_err(DatatableError::query_execution)?;

        let total = self.total_count().await?;
        // cached counts may lag behind each other
        let filtered = filtered_count.map_or(total, |count| count.min(total));

        tracing::debug!(
            rows = data.len(),
            total,
            filtered,
            start = query.start(),
            length = ?query.length(),
            "Processed table query"
        );

        Ok(ResponseData::new(data, total, filtered))
    }

    async fn total_count(&self) -> Result<u64> {
        if let Some(cache) = &self.cache
            && let Some(count) = cache.get_total_items().await
        {
            return Ok(count);
        }

        let count = self
            .builder
            .count()
            .await
            .map_err(DatatableError::query_execution)?;

        if let Some(cache) = &self.cache {
            cache.put_total_items(count).await;
        }
        Ok(count)
    }

    async fn filtered_count(&self, builder: &Q, query: &QueryConfiguration) -> Result<u64> {
        // the key carries the term only, so it must identify a LIKE search on its own
        let cache_key = match (&self.cache, query.search_value()) {
            (Some(cache), Some(term))
                if query.is_global_search()
                    && !query.is_column_search()
                    && !query.is_global_regex() =>
            {
                Some((cache, term))
            }
            _ => None,
        };

        if let Some((cache, term)) = cache_key
            && let Some(count) = cache.get_total_items_with_search_value(term).await
        {
            return Ok(count);
        }

        let count = builder
            .count()
            .await
            .map_err(DatatableError::query_execution)?;

        if let Some((cache, term)) = cache_key {
            cache.put_total_items_with_search_value(term, count).await;
        }
        Ok(count)
    }
}

/// Issue one `or_where` per searchable column that has an effective term.
/// Returns whether any predicate was added.
fn apply_search<Q: QueryBuilder>(
    builder: &mut Q,
    query: &QueryConfiguration,
    columns: &[ColumnConfiguration],
) -> bool {
    if !query.has_search() {
        return false;
    }

    let global = query.search_value().filter(|term| !term.is_empty());
    let mut applied = false;

    for column in columns {
        if !column.searchable().is_searchable() {
            continue;
        }

        let term = query
            .column_search(column.name())
            .filter(|term| !term.is_empty())
            .or(global);
        let Some(term) = term else {
            continue;
        };

        builder.or_where(SearchPredicate::for_column(column, term, query.is_global_regex()));
        applied = true;
    }

    applied
}
