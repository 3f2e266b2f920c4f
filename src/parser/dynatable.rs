//! Dynatable (<https://www.dynatable.com/>) request format.
//!
//! ```text
//! GET /people?page=2&perPage=10&offset=10&queries[search]=bob&sorts[name]=1&sorts[age]=-1
//! ```

use super::QueryParser;
use crate::columns::{ColumnConfiguration, find_column};
use crate::errors::{DatatableError, Result};
use crate::params::{RequestParams, scalar_i64, scalar_text};
use crate::query::{OrderDirection, QueryConfiguration, QueryConfigurationBuilder};

/// Sort code Dynatable sends for ascending order; every other code is descending.
const ASCENDING_CODE: i64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DynatableQueryParser;

impl QueryParser for DynatableQueryParser {
    fn can_parse(&self, params: &RequestParams) -> bool {
        params.has("perPage")
    }

    fn parse(
        &self,
        params: &RequestParams,
        columns: &[ColumnConfiguration],
    ) -> Result<QueryConfiguration> {
        let mut builder = QueryConfiguration::builder();

        if let Some(offset) = params.get_u64("offset") {
            builder = builder.start(offset);
        }

        if let Some(per_page) = params.get_u64("perPage") {
            builder = builder.length(per_page);
        }

        builder = parse_search(params, builder);
        builder = parse_sorts(params, builder, columns)?;

        Ok(builder.build())
    }
}

fn parse_search(params: &RequestParams, builder: QueryConfigurationBuilder) -> QueryConfigurationBuilder {
    let search = params
        .get_object("queries")
        .and_then(|queries| queries.get("search"))
        .and_then(scalar_text);

    match search {
        // an empty term means "no search", not "match everything with ''"
        Some(term) if !term.is_empty() => builder.search_value(term),
        _ => builder,
    }
}

fn parse_sorts(
    params: &RequestParams,
    mut builder: QueryConfigurationBuilder,
    columns: &[ColumnConfiguration],
) -> Result<QueryConfigurationBuilder> {
    let Some(sorts) = params.get_object("sorts") else {
        return Ok(builder);
    };

    for (name, code) in sorts {
        let Some(column) = find_column(columns, name) else {
            return Err(DatatableError::unknown_column(name.as_str()));
        };
        if !column.orderable().is_orderable() {
            tracing::debug!(column = column.name(), "Dropping sort on unorderable column");
            continue;
        }

        let direction = if scalar_i64(code) == Some(ASCENDING_CODE) {
            OrderDirection::Asc
        } else {
            OrderDirection::Desc
        };
        builder = builder.column_order(name.as_str(), direction);
    }

    Ok(builder)
}
