//! DataTables 1.9 legacy server-side format
//! (<http://legacy.datatables.net/usage/server-side>).
//!
//! Per-column parameters are addressed by 0-based column position, not by name:
//!
//! ```text
//! sEcho=3&iDisplayStart=0&iDisplayLength=10&sSearch=foo&bRegex=false
//! &sSearch_0=&sSearch_1=bar&iSortingCols=2&iSortCol_0=1&sSortDir_0=asc&iSortCol_1=0&sSortDir_1=desc
//! ```
//!
//! The client also sends `iColumns`, `bSearchable_N`, `bRegex_N` and
//! `bSortable_N`. They are ignored: the server side column configuration
//! decides what may be searched and sorted.

use super::QueryParser;
use crate::columns::ColumnConfiguration;
use crate::errors::{DatatableError, Result};
use crate::params::RequestParams;
use crate::query::{OrderDirection, QueryConfiguration, QueryConfigurationBuilder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Datatable19QueryParser;

impl QueryParser for Datatable19QueryParser {
    fn can_parse(&self, params: &RequestParams) -> bool {
        params.has("sEcho")
    }

    fn parse(
        &self,
        params: &RequestParams,
        columns: &[ColumnConfiguration],
    ) -> Result<QueryConfiguration> {
        let mut builder = QueryConfiguration::builder();

        if let Some(echo) = params.get_str("sEcho") {
            builder = builder.draw_call(echo);
        }

        if let Some(start) = params.get_u64("iDisplayStart") {
            builder = builder.start(start);
        }

        // -1 asks for all rows
        if let Some(length) = params.get_u64("iDisplayLength") {
            builder = builder.length(length);
        }

        if let Some(search) = params.get_str("sSearch")
            && !search.is_empty()
        {
            builder = builder.search_value(search);
        }
        builder = builder.search_regex(params.get_bool("bRegex"));

        builder = parse_column_search(params, builder, columns);
        builder = parse_column_order(params, builder, columns)?;

        Ok(builder.build())
    }
}

fn parse_column_search(
    params: &RequestParams,
    mut builder: QueryConfigurationBuilder,
    columns: &[ColumnConfiguration],
) -> QueryConfigurationBuilder {
    for (position, column) in columns.iter().enumerate() {
        if !column.searchable().is_searchable() {
            continue;
        }
        if let Some(term) = params.get_str(&format!("sSearch_{position}"))
            && !term.is_empty()
        {
            builder = builder.column_search(column.name(), term);
        }
    }
    builder
}

fn parse_column_order(
    params: &RequestParams,
    mut builder: QueryConfigurationBuilder,
    columns: &[ColumnConfiguration],
) -> Result<QueryConfigurationBuilder> {
    let sorting_columns = params.get_u64("iSortingCols").unwrap_or(0);

    for index in 0..sorting_columns {
        let key = format!("iSortCol_{index}");
        let column = params
            .get_u64(&key)
            .and_then(|position| usize::try_from(position).ok())
            .and_then(|position| columns.get(position))
            .ok_or_else(|| {
                DatatableError::unknown_column(params.get_str(&key).unwrap_or_default())
            })?;

        if !column.orderable().is_orderable() {
            tracing::debug!(column = column.name(), "Dropping sort on unorderable column");
            continue;
        }

        let direction = params
            .get_str(&format!("sSortDir_{index}"))
            .map_or(OrderDirection::Asc, |dir| OrderDirection::from_text(&dir));
        builder = builder.column_order(column.name(), direction);
    }

    Ok(builder)
}
