//! # Query Parsers
//!
//! Each supported table widget speaks its own parameter dialect. A parser
//! decides whether it recognises a request ([`QueryParser::can_parse`]) and
//! turns it into the canonical [`QueryConfiguration`] ([`QueryParser::parse`]).
//!
//! Parsers resolve every column reference against the table's
//! [`ColumnConfiguration`]s:
//!
//! - a column that does not exist is a client bug and fails with
//!   [`DatatableError::UnknownColumn`],
//! - a column that exists but has the requested capability disabled is
//!   dropped silently, the server's column configuration wins.
//!
//! [`ParserChain`] tries the registered parsers in a fixed priority order and
//! uses the first one that claims the request.
//!
//! ```rust,ignore
//! let chain = ParserChain::default();
//! let query = chain.parse(&RequestParams::from_query("page=1&perPage=10&offset=0"), &columns)?;
//! ```

pub mod datatable19;
pub mod dynatable;

pub use datatable19::Datatable19QueryParser;
pub use dynatable::DynatableQueryParser;

use crate::columns::ColumnConfiguration;
use crate::errors::{DatatableError, Result};
use crate::params::RequestParams;
use crate::query::QueryConfiguration;

/// Capability shared by every wire format.
pub trait QueryParser {
    /// Whether the request carries the parameters this format is recognised by.
    fn can_parse(&self, params: &RequestParams) -> bool;

    /// Convert the request into a query configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DatatableError::UnknownColumn`] when the request references a
    /// column that is not part of `columns`.
    fn parse(
        &self,
        params: &RequestParams,
        columns: &[ColumnConfiguration],
    ) -> Result<QueryConfiguration>;
}

/// The closed set of supported wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parser {
    Dynatable(DynatableQueryParser),
    Datatable19(Datatable19QueryParser),
}

impl Parser {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dynatable(_) => "dynatable",
            Self::Datatable19(_) => "datatable19",
        }
    }
}

impl QueryParser for Parser {
    fn can_parse(&self, params: &RequestParams) -> bool {
        match self {
            Self::Dynatable(parser) => parser.can_parse(params),
            Self::Datatable19(parser) => parser.can_parse(params),
        }
    }

    fn parse(
        &self,
        params: &RequestParams,
        columns: &[ColumnConfiguration],
    ) -> Result<QueryConfiguration> {
        match self {
            Self::Dynatable(parser) => parser.parse(params, columns),
            Self::Datatable19(parser) => parser.parse(params, columns),
        }
    }
}

impl From<DynatableQueryParser> for Parser {
    fn from(parser: DynatableQueryParser) -> Self {
        Self::Dynatable(parser)
    }
}

impl From<Datatable19QueryParser> for Parser {
    fn from(parser: Datatable19QueryParser) -> Self {
        Self::Datatable19(parser)
    }
}

/// Ordered list of parsers; the first one able to parse a request wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserChain {
    parsers: Vec<Parser>,
}

impl ParserChain {
    #[must_use]
    pub fn new(parsers: Vec<Parser>) -> Self {
        Self { parsers }
    }

    #[must_use]
    pub fn parsers(&self) -> &[Parser] {
        &self.parsers
    }

    /// First parser that claims the request.
    #[must_use]
    pub fn select(&self, params: &RequestParams) -> Option<&Parser> {
        self.parsers.iter().find(|parser| parser.can_parse(params))
    }

    /// Parse with the first matching parser.
    ///
    /// # Errors
    ///
    /// Returns [`DatatableError::NoParserFound`] when no parser claims the
    /// request, or whatever error the selected parser produces.
    pub fn parse(
        &self,
        params: &RequestParams,
        columns: &[ColumnConfiguration],
    ) -> Result<QueryConfiguration> {
        let parser = self.select(params).ok_or(DatatableError::NoParserFound)?;
        tracing::debug!(parser = parser.name(), "Parsing table request");
        parser.parse(params, columns)
    }
}

impl Default for ParserChain {
    fn default() -> Self {
        Self::new(vec![
            Parser::Dynatable(DynatableQueryParser),
            Parser::Datatable19(Datatable19QueryParser),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnConfiguration> {
        vec![ColumnConfiguration::builder().name("name").build().unwrap()]
    }

    #[test]
    fn test_dispatch_to_dynatable() {
        let params = RequestParams::from_query("page=1&perPage=10&offset=20");
        let chain = ParserChain::default();

        assert_eq!(chain.select(&params).map(Parser::name), Some("dynatable"));
        let query = chain.parse(&params, &columns()).unwrap();
        assert_eq!(query.start(), 20);
    }

    #[test]
    fn test_dispatch_to_datatable19() {
        let params = RequestParams::from_query("sEcho=1&iDisplayStart=0&iDisplayLength=10");
        let chain = ParserChain::default();

        assert_eq!(chain.select(&params).map(Parser::name), Some("datatable19"));
        let query = chain.parse(&params, &columns()).unwrap();
        assert_eq!(query.draw_call(), Some("1"));
    }

    #[test]
    fn test_no_parser_found() {
        let params = RequestParams::from_query("foo=bar");
        let err = ParserChain::default().parse(&params, &columns()).unwrap_err();
        assert!(matches!(err, DatatableError::NoParserFound));
    }

    #[test]
    fn test_priority_order_decides_ambiguous_requests() {
        // carries the recognition keys of both formats
        let params = RequestParams::from_query("page=1&perPage=10&sEcho=4");

        let dynatable_first = ParserChain::default();
        assert_eq!(dynatable_first.select(&params).map(Parser::name), Some("dynatable"));

        let legacy_first = ParserChain::new(vec![
            Datatable19QueryParser.into(),
            DynatableQueryParser.into(),
        ]);
        assert_eq!(legacy_first.select(&params).map(Parser::name), Some("datatable19"));
    }

    #[test]
    fn test_empty_chain_finds_nothing() {
        let chain = ParserChain::new(Vec::new());
        let params = RequestParams::from_query("page=1&perPage=10");
        assert!(matches!(
            chain.parse(&params, &columns()),
            Err(DatatableError::NoParserFound)
        ));
    }
}
