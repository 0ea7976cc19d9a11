//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbBackend, Schema};

use crud_template::infra::repositories::entities::category;
use crud_template::infra::{CategoryStore, ExecutionStrategy, FixedClock, Persistence};

/// Fresh in-memory database with the categories table.
pub async fn setup_db() -> DatabaseConnection {
    let db = SeaDatabase::connect("sqlite::memory:")
        .await
        .expect("sqlite connects");

    let schema = Schema::new(DbBackend::Sqlite);
    let statement = schema.create_table_from_entity(category::Entity);
    db.execute(db.get_database_backend().build(&statement))
        .await
        .expect("categories table created");

    db
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

pub fn persistence(db: &DatabaseConnection) -> Persistence {
    Persistence::new(db.clone(), ExecutionStrategy::new(2, Duration::ZERO))
        .with_clock(Arc::new(FixedClock(fixed_time())))
}

pub fn store(db: &DatabaseConnection) -> CategoryStore {
    CategoryStore::new(persistence(db))
}
