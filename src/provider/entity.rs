//! Sea-ORM data source.
//!
//! Searches, sorts and paginates a [`Select`] of any entity and returns rows as
//! JSON objects holding only the configured columns. Column names are used as
//! plain SQL identifiers, so they must match the table's column names.
//!
//! Matching per backend:
//!
//! | Operator | SQLite / MySQL                   | Postgres                                |
//! |----------|----------------------------------|-----------------------------------------|
//! | `LIKE`   | `UPPER(col) LIKE UPPER(pattern)` | `UPPER(CAST(col AS text)) LIKE ...`     |
//! | `REGEXP` | `col REGEXP pattern`             | `col ~ pattern`                         |
//!
//! SQLite only understands `REGEXP` when the connection registers a
//! `regexp()` function.

use super::{QueryBuilder, SearchOperator, SearchPredicate};
use crate::query::OrderDirection;
use async_trait::async_trait;
use sea_orm::{
    Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};
use serde_json::Value;

pub struct EntityQueryBuilder<E: EntityTrait> {
    db: DatabaseConnection,
    select: Select<E>,
    search: Option<Condition>,
    orders: Vec<(String, OrderDirection)>,
    offset: u64,
    limit: Option<u64>,
}

impl<E: EntityTrait> Clone for EntityQueryBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            select: self.select.clone(),
            search: self.search.clone(),
            orders: self.orders.clone(),
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl<E: EntityTrait> EntityQueryBuilder<E> {
    /// Query every row of the entity's table.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::from_select(db, E::find())
    }

    /// Query the rows of an existing select, e.g. one with a tenant filter
    /// already applied. That filter also restricts the total count.
    #[must_use]
    pub fn from_select(db: DatabaseConnection, select: Select<E>) -> Self {
        Self {
            db,
            select,
            search: None,
            orders: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    fn filtered(&self) -> Select<E> {
        match &self.search {
            Some(condition) => self.select.clone().filter(condition.clone()),
            None => self.select.clone(),
        }
    }

    fn predicate_expr(&self, predicate: &SearchPredicate) -> SimpleExpr {
        predicate_expr(self.db.get_database_backend(), predicate)
    }
}

fn column(name: &str) -> SimpleExpr {
    Expr::col(Alias::new(name)).into()
}

fn predicate_expr(backend: DatabaseBackend, predicate: &SearchPredicate) -> SimpleExpr {
    match predicate.operator {
        SearchOperator::Like => {
            let target = match backend {
                DatabaseBackend::Postgres => Expr::col(Alias::new(&predicate.column))
                    .cast_as(Alias::new("text")),
                _ => column(&predicate.column),
            };
            Expr::expr(Func::upper(target)).like(predicate.pattern.to_uppercase())
        }
        SearchOperator::Regexp => {
            let template = match backend {
                DatabaseBackend::Postgres => "$1 ~ $2",
                _ => "$1 REGEXP $2",
            };
            Expr::cust_with_exprs(
                template,
                [column(&predicate.column), Expr::val(predicate.pattern.as_str()).into()],
            )
        }
    }
}

#[async_trait]
impl<E> QueryBuilder for EntityQueryBuilder<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    type Row = Value;

    fn or_where(&mut self, predicate: SearchPredicate) {
        let expr = self.predicate_expr(&predicate);
        let condition = self.search.take().unwrap_or_else(Condition::any);
        self.search = Some(condition.add(expr));
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
        self.filtered().count(&self.db).await
    }

    async fn fetch(&self, columns: &[String]) -> Result<Vec<Value>, DbErr> {
        let mut select = self.filtered().select_only();
        for name in columns {
            select = select.column_as(column(name), name.as_str());
        }

        for (name, direction) in &self.orders {
            let order = match direction {
                OrderDirection::Asc => Order::Asc,
                OrderDirection::Desc => Order::Desc,
            };
            select = select.order_by(column(name), order);
        }

        if self.offset > 0 {
            select = select.offset(self.offset);
        }
        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }

        select.into_json().all(&self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{
        MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryStatementWriter, SqliteQueryBuilder,
    };

    fn predicate(operator: SearchOperator, pattern: &str) -> SearchPredicate {
        SearchPredicate {
            column: "name".to_string(),
            operator,
            pattern: pattern.to_string(),
        }
    }

    fn where_clause(backend: DatabaseBackend, predicate: &SearchPredicate) -> String {
        let statement = Query::select()
            .column(Alias::new("name"))
            .from(Alias::new("people"))
            .and_where(predicate_expr(backend, predicate))
            .to_owned();
        match backend {
            DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
            DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
            DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
        }
    }

    #[test]
    fn test_like_uppercases_both_sides() {
        let sql = where_clause(DatabaseBackend::Sqlite, &predicate(SearchOperator::Like, "%bob%"));
        assert!(sql.contains(r#"UPPER("name") LIKE '%BOB%'"#), "{sql}");
    }

    #[test]
    fn test_like_casts_to_text_on_postgres() {
        let sql = where_clause(DatabaseBackend::Postgres, &predicate(SearchOperator::Like, "%1%"));
        assert!(sql.contains(r#"UPPER(CAST("name" AS "#), "{sql}");
        assert!(sql.contains("LIKE '%1%'"), "{sql}");
    }

    #[test]
    fn test_regexp_operator_per_backend() {
        let regex = predicate(SearchOperator::Regexp, "^B");

        let sql = where_clause(DatabaseBackend::MySql, &regex);
        assert!(sql.contains("`name` REGEXP '^B'"), "{sql}");

        let sql = where_clause(DatabaseBackend::Postgres, &regex);
        assert!(sql.contains(r#""name" ~ '^B'"#), "{sql}");
    }
}
