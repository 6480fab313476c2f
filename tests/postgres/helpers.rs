//! Shared setup for `PostgreSQL` store tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use tasklane::identity::domain::UserId;
use tasklane::store::adapters::postgres::{PostgresKeyedStore, StorePgPool};
use tasklane::task::domain::{Task, TaskDraft};
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Schema for the items table and the change log.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-01-01-000000_create_items/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "tasklane_test_template";

/// Creates a runtime for driving the async store from sync tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("schema migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Creates a database from the template and a store over a pool of
/// `connections` connections.
pub fn setup_store(
    cluster: &TestCluster,
    db_name: &str,
    connections: u32,
) -> Result<PostgresKeyedStore, BoxError> {
    cluster
        .create_database_from_template(db_name, TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let url = cluster.connection().database_url(db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool: StorePgPool = Pool::builder()
        .max_size(connections)
        .build(manager)
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(PostgresKeyedStore::new(pool))
}

/// Drops the test database when the test ends, even on panic.
pub struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl<'a> CleanupGuard<'a> {
    pub const fn new(cluster: &'a TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.db_name.as_str()) {
            tracing::warn!(db_name = %self.db_name, error = %err, "failed to drop test database");
        }
    }
}

/// Prepares a fresh database and store for one test.
pub fn prepared_store(
    cluster: &'static TestCluster,
    prefix: &str,
    connections: u32,
) -> (CleanupGuard<'static>, PostgresKeyedStore) {
    ensure_template(cluster).expect("template setup");
    let db_name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
    let guard = CleanupGuard::new(cluster, db_name.clone());
    let store = setup_store(cluster, &db_name, connections).expect("store setup");
    (guard, store)
}

/// Builds an `OPEN` task created by `admin`.
pub fn open_task(title: &str) -> Task {
    Task::create(TaskDraft::new(title), user("admin"), &DefaultClock).expect("valid task")
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}
