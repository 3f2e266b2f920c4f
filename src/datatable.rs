//! # Table Endpoint
//!
//! [`Datatable`] ties the pieces together for one table: it owns the column
//! configuration, knows which wire formats the endpoint accepts and, given the
//! request parameters and a data source, produces the widget's JSON body.
//!
//! ```rust,ignore
//! async fn people(
//!     State(state): State<AppState>,
//!     params: RequestParams,
//! ) -> Result<Json<Value>, DatatableError> {
//!     state
//!         .table
//!         .handle(&params, EntityQueryBuilder::<person::Entity>::new(state.db.clone()))
//!         .await
//! }
//! ```

use crate::cache::CountCache;
use crate::columns::ColumnConfiguration;
use crate::errors::{DatatableError, Result};
use crate::params::RequestParams;
use crate::parser::{ParserChain, QueryParser};
use crate::provider::{QueryBuilder, QueryBuilderProvider};
use crate::versions::DatatableVersion;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;

/// One server-side table. Cheap to clone, so it can live in axum state.
#[derive(Clone)]
pub struct Datatable {
    columns: Vec<ColumnConfiguration>,
    parsers: ParserChain,
    cache: Option<Arc<dyn CountCache>>,
}

impl Datatable {
    /// A table over `columns` accepting every supported version.
    #[must_use]
    pub fn new(columns: Vec<ColumnConfiguration>) -> Self {
        Self {
            columns,
            parsers: DatatableVersion::ALL.into_iter().collect(),
            cache: None,
        }
    }

    /// Restrict the accepted versions. Earlier versions win when a request
    /// could be read by several.
    #[must_use]
    pub fn with_versions(mut self, versions: impl IntoIterator<Item = DatatableVersion>) -> Self {
        self.parsers = versions.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CountCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnConfiguration] {
        &self.columns
    }

    /// Accepted versions in priority order.
    #[must_use]
    pub fn versions(&self) -> Vec<DatatableVersion> {
        self.parsers.parsers().iter().copied().map(DatatableVersion::from).collect()
    }

    /// The first accepted version able to read `params`.
    #[must_use]
    pub fn select_version(&self, params: &RequestParams) -> Option<DatatableVersion> {
        self.parsers.select(params).copied().map(DatatableVersion::from)
    }

    /// Parse the request, run it against `builder` and render the response.
    ///
    /// # Errors
    ///
    /// - [`DatatableError::NoParserFound`] if no accepted version reads the request
    /// - [`DatatableError::UnknownColumn`] if the request names a column the table lacks
    /// - [`DatatableError::QueryExecution`] if the data source fails
    pub async fn handle<Q>(&self, params: &RequestParams, builder: Q) -> Result<Json<Value>>
    where
        Q: QueryBuilder<Row = Value>,
    {
        let parser = self
            .parsers
            .select(params)
            .ok_or(DatatableError::NoParserFound)?;
        let version = DatatableVersion::from(*parser);
        tracing::debug!(version = version.name(), "Handling table request");

        let query = parser.parse(params, &self.columns)?;

        let mut provider = QueryBuilderProvider::new(builder);
        if let Some(cache) = &self.cache {
            provider = provider.with_cache(Arc::clone(cache));
        }
        provider.prepare_for_processing(query.clone(), self.columns.clone())?;
        let data = provider.process().await?;

        Ok(Json(version.create_response(data, &query)))
    }
}
