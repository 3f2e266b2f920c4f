//! Wire formats: which parser reads a widget's request and what JSON body the
//! widget expects back.

use crate::parser::{Datatable19QueryParser, DynatableQueryParser, Parser, ParserChain};
use crate::provider::ResponseData;
use crate::query::QueryConfiguration;
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatatableVersion {
    /// <https://www.dynatable.com/>
    Dynatable,
    /// <http://legacy.datatables.net/usage/server-side>
    Datatable19,
}

/// Body returned to Dynatable.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynatableResponse {
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<Value>,
    pub total_record_count: u64,
    pub query_record_count: u64,
}

/// Body returned to DataTables 1.9.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Datatable19Response {
    /// Draw counter from the request, echoed as an integer
    #[serde(rename = "sEcho")]
    pub s_echo: Option<u64>,
    #[serde(rename = "iTotalRecords")]
    pub i_total_records: u64,
    #[serde(rename = "iTotalDisplayRecords")]
    pub i_total_display_records: u64,
    #[serde(rename = "aaData")]
    #[schema(value_type = Vec<Object>)]
    pub aa_data: Vec<Value>,
}

impl DatatableVersion {
    /// Priority order used when a table does not choose its own versions.
    pub const ALL: [Self; 2] = [Self::Dynatable, Self::Datatable19];

    #[must_use]
    pub const fn parser(self) -> Parser {
        match self {
            Self::Dynatable => Parser::Dynatable(DynatableQueryParser),
            Self::Datatable19 => Parser::Datatable19(Datatable19QueryParser),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.parser().name()
    }

    /// Render processed rows in this version's response shape.
    #[must_use]
    pub fn create_response(self, data: ResponseData<Value>, query: &QueryConfiguration) -> Value {
        let total = data.total_data_count();
        let filtered = data.filtered_data_count();
        let rows = data.into_data();

        let body = match self {
            Self::Dynatable => serde_json::to_value(DynatableResponse {
                records: rows,
                total_record_count: total,
                query_record_count: filtered,
            }),
            Self::Datatable19 => serde_json::to_value(Datatable19Response {
                // non-numeric draw counters are dropped
                s_echo: query.draw_call().and_then(|echo| echo.parse().ok()),
                i_total_records: total,
                i_total_display_records: filtered,
                aa_data: rows,
            }),
        };

        // serializing these structs cannot fail
        body.unwrap_or(Value::Null)
    }
}

impl From<Parser> for DatatableVersion {
    fn from(parser: Parser) -> Self {
        match parser {
            Parser::Dynatable(_) => Self::Dynatable,
            Parser::Datatable19(_) => Self::Datatable19,
        }
    }
}

impl FromIterator<DatatableVersion> for ParserChain {
    fn from_iter<I: IntoIterator<Item = DatatableVersion>>(versions: I) -> Self {
        Self::new(versions.into_iter().map(DatatableVersion::parser).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::QueryParser;
    use crate::params::RequestParams;
    use serde_json::json;

    fn data() -> ResponseData<Value> {
        ResponseData::new(vec![json!({"name": "Bob"})], 10, 3)
    }

    #[test]
    fn test_dynatable_body() {
        let body = DatatableVersion::Dynatable
            .create_response(data(), &QueryConfiguration::builder().build());
        assert_eq!(
            body,
            json!({
                "records": [{"name": "Bob"}],
                "totalRecordCount": 10,
                "queryRecordCount": 3,
            })
        );
    }

    #[test]
    fn test_datatable19_body_echoes_draw_call() {
        let query = QueryConfiguration::builder().draw_call("7").build();
        let body = DatatableVersion::Datatable19.create_response(data(), &query);
        assert_eq!(
            body,
            json!({
                "sEcho": 7,
                "iTotalRecords": 10,
                "iTotalDisplayRecords": 3,
                "aaData": [{"name": "Bob"}],
            })
        );
    }

    #[test]
    fn test_datatable19_body_drops_non_numeric_echo() {
        let query = QueryConfiguration::builder()
            .draw_call("<script>")
            .build();
        let body = DatatableVersion::Datatable19.create_response(data(), &query);
        assert!(body.get("sEcho").is_none());
    }

    #[test]
    fn test_parsers_match_their_requests() {
        let dynatable = RequestParams::from_query("page=1&perPage=10");
        let legacy = RequestParams::from_query("sEcho=1");

        assert!(DatatableVersion::Dynatable.parser().can_parse(&dynatable));
        assert!(!DatatableVersion::Dynatable.parser().can_parse(&legacy));
        assert!(DatatableVersion::Datatable19.parser().can_parse(&legacy));
        assert_eq!(DatatableVersion::Datatable19.name(), "datatable19");
    }
}
