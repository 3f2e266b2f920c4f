#![allow(dead_code)]

use axum::{Json, Router, extract::State, routing::get};
use datatable::{
    ColumnConfiguration, Datatable, DatatableError, EntityQueryBuilder, Orderable, RequestParams,
    Searchable,
};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::prelude::*;
use serde_json::Value;

pub mod person_entity;

/// (name, email, city, age)
pub const PEOPLE: [(&str, &str, &str, Option<i32>); 6] = [
    ("Alice", "alice@example.com", "Bern", Some(31)),
    ("Bob", "bob@example.com", "Zurich", Some(25)),
    ("Carol", "carol@example.com", "Basel", None),
    ("Dave", "dave@example.com", "Geneva", Some(25)),
    ("Eve", "eve@example.com", "Bern", Some(40)),
    ("Robert", "robert@example.com", "Zurich", Some(52)),
];

/// Route `tracing` output through the test harness; `RUST_LOG=datatable=debug` shows it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    for (name, email, city, age) in PEOPLE {
        person_entity::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            city: Set(city.to_string()),
            age: Set(age),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }

    Ok(db)
}

/// id, name, city, age; `email` is deliberately not exposed.
pub fn people_columns() -> Vec<ColumnConfiguration> {
    vec![
        ColumnConfiguration::builder()
            .name("id")
            .searchable(Searchable::None)
            .build()
            .unwrap(),
        ColumnConfiguration::builder().name("name").build().unwrap(),
        ColumnConfiguration::builder().name("city").build().unwrap(),
        ColumnConfiguration::builder()
            .name("age")
            .searchable(Searchable::None)
            .orderable(Orderable::AscDesc)
            .build()
            .unwrap(),
    ]
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub table: Datatable,
}

async fn people_handler(
    State(state): State<AppState>,
    params: RequestParams,
) -> Result<Json<Value>, DatatableError> {
    state
        .table
        .handle(
            &params,
            EntityQueryBuilder::<person_entity::Entity>::new(state.db.clone()),
        )
        .await
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    setup_test_app_with_table(db, Datatable::new(people_columns()))
}

pub fn setup_test_app_with_table(db: DatabaseConnection, table: Datatable) -> Router {
    let api = Router::new()
        .route("/people", get(people_handler))
        .with_state(AppState { db, table });

    Router::new().nest("/api/v1", api)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreatePeopleTable)]
    }
}

pub struct CreatePeopleTable;

impl MigrationName for CreatePeopleTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_people_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreatePeopleTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(People::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(People::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(People::Name).string().not_null())
            .col(ColumnDef::new(People::Email).string().not_null())
            .col(ColumnDef::new(People::City).string().not_null())
            .col(ColumnDef::new(People::Age).integer().null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(People::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum People {
    Table,
    Id,
    Name,
    Email,
    City,
    Age,
}
