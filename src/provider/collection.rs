//! In-memory data source over JSON objects.
//!
//! Useful for small, already materialised tables and for tests. Matching
//! follows SQL semantics where they differ from plain Rust string handling:
//! `LIKE` patterns use `%`/`_` wildcards and ignore case, `NULL` never matches.

use super::{QueryBuilder, SearchOperator, SearchPredicate};
use crate::query::OrderDirection;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use sea_orm::DbErr;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CollectionQueryBuilder {
    rows: Arc<Vec<Value>>,
    predicates: Vec<SearchPredicate>,
    orders: Vec<(String, OrderDirection)>,
    offset: u64,
    limit: Option<u64>,
}

impl CollectionQueryBuilder {
    #[must_use]
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: Arc::new(rows),
            predicates: Vec::new(),
            orders: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    fn matching_rows(&self) -> Result<Vec<&Value>, DbErr> {
        if self.predicates.is_empty() {
            return Ok(self.rows.iter().collect());
        }

        let matchers = self
            .predicates
            .iter()
            .map(|predicate| Ok((predicate.column.as_str(), compile(predicate)?)))
            .collect::<Result<Vec<_>, DbErr>>()?;

        Ok(self
            .rows
            .iter()
            .filter(|row| {
                matchers.iter().any(|(column, matcher)| {
                    row.get(*column)
                        .and_then(field_text)
                        .is_some_and(|text| matcher.is_match(&text))
                })
            })
            .collect())
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (column, direction) in &self.orders {
            let ordering = compare_values(
                a.get(column).unwrap_or(&Value::Null),
                b.get(column).unwrap_or(&Value::Null),
            );
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[async_trait]
impl QueryBuilder for CollectionQueryBuilder {
    type Row = Value;

    fn or_where(&mut self, predicate: SearchPredicate) {
        self.predicates.push(predicate);
    }

    fn order_by(&mut self, column: &str, direction: OrderDirection) {
        self.orders.push((column.to_string(), direction));
    }

    fn skip(&mut self, offset: u64) {
        self.offset = offset;
    }

    fn limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    async fn count(&self) -> Result<u64, DbErr> {
        Ok(self.matching_rows()?.len() as u64)
    }

    async fn fetch(&self, columns: &[String]) -> Result<Vec<Value>, DbErr> {
        let mut rows = self.matching_rows()?;
        // stable, so rows equal on every key keep their source order
        rows.sort_by(|a, b| self.compare(a, b));

        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = self
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(row, columns))
            .collect())
    }
}

fn compile(predicate: &SearchPredicate) -> Result<Regex, DbErr> {
    let built = match predicate.operator {
        SearchOperator::Like => RegexBuilder::new(&like_to_regex(&predicate.pattern))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build(),
        SearchOperator::Regexp => Regex::new(&predicate.pattern),
    };
    built.map_err(|e| DbErr::Custom(format!("invalid search pattern: {e}")))
}

/// Translate a SQL `LIKE` pattern into an anchored regular expression.
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    regex.push('$');
    regex
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// NULL < booleans < numbers < strings < arrays/objects
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    let mut projected = Map::with_capacity(columns.len());
    for column in columns {
        projected.insert(
            column.clone(),
            row.get(column).cloned().unwrap_or(Value::Null),
        );
    }
    Value::Object(projected)
}
