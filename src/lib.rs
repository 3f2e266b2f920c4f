//! Server-side processing for table widgets such as Dynatable and DataTables.
//!
//! A widget sends its paging, search and sort state as request parameters.
//! This crate reads them in the widget's own dialect, validates them against
//! the table's [`ColumnConfiguration`]s, runs the resulting
//! [`QueryConfiguration`] against a data source and renders the JSON body the
//! widget expects.
//!
//! ```rust,ignore
//! let table = Datatable::new(vec![
//!     ColumnConfiguration::builder().name("id").searchable(Searchable::None).build()?,
//!     ColumnConfiguration::builder().name("name").build()?,
//! ]);
//!
//! let app = Router::new().route(
//!     "/people",
//!     get(|params: RequestParams| async move {
//!         table.handle(&params, EntityQueryBuilder::<person::Entity>::new(db)).await
//!     }),
//! );
//! ```

pub mod cache;
pub mod columns;
pub mod datatable;
pub mod errors;
pub mod params;
pub mod parser;
pub mod provider;
pub mod query;
pub mod versions;

pub use cache::{CacheConfig, CacheStore, CountCache, MokaStore, SensibleCache};
pub use columns::{ColumnConfiguration, ColumnConfigurationBuilder, Orderable, Searchable};
pub use datatable::Datatable;
pub use errors::{DatatableError, Result};
pub use params::RequestParams;
pub use parser::{Parser, ParserChain, QueryParser};
pub use provider::{
    CollectionQueryBuilder, EntityQueryBuilder, QueryBuilder, QueryBuilderProvider, ResponseData,
    SearchOperator, SearchPredicate,
};
pub use query::{ColumnOrder, OrderDirection, QueryConfiguration, QueryConfigurationBuilder};
pub use versions::{Datatable19Response, DatatableVersion, DynatableResponse};
