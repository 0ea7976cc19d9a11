//! Unit of Work pattern implementation.
//!
//! - [`Session`] owns a connection and at most one explicit transaction.
//! - [`ExecutionStrategy`] replays an operation on transient storage failures.
//! - [`Persistence`] builds repositories with the audit hook registered.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, IntoActiveModel,
    PaginatorTrait, Select, TransactionTrait,
};

use super::audit::{AuditHook, Clock, IdentityProvider, SystemClock};
use super::repositories::{AuditedEntity, Repository};
use crate::config::Config;
use crate::errors::{AppError, AppResult};

/// Connection plus an optional explicit transaction.
///
/// Reads run inside the transaction when one is open. Dropping the session
/// with an open transaction rolls it back.
pub struct Session {
    db: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
}

impl Session {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, txn: None }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn transaction(&self) -> Option<&DatabaseTransaction> {
        self.txn.as_ref()
    }

    pub fn has_transaction(&self) -> bool {
        self.txn.is_some()
    }

    pub async fn begin(&mut self) -> AppResult<()> {
        if self.txn.is_some() {
            return Err(AppError::internal("A transaction is already open"));
        }
        self.txn = Some(self.db.begin().await?);
        Ok(())
    }

    pub async fn commit(&mut self) -> AppResult<()> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| AppError::internal("No transaction is open"))?;
        txn.commit().await.map_err(AppError::from)
    }

    pub async fn rollback(&mut self) -> AppResult<()> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| AppError::internal("No transaction is open"))?;
        txn.rollback().await.map_err(AppError::from)
    }

    pub async fn all<E: EntityTrait>(&self, select: Select<E>) -> AppResult<Vec<E::Model>> {
        let rows = match &self.txn {
            Some(txn) => select.all(txn).await?,
            None => select.all(&self.db).await?,
        };
        Ok(rows)
    }

    pub async fn one<E: EntityTrait>(&self, select: Select<E>) -> AppResult<Option<E::Model>> {
        let row = match &self.txn {
            Some(txn) => select.one(txn).await?,
            None => select.one(&self.db).await?,
        };
        Ok(row)
    }

    pub async fn count<E>(&self, select: Select<E>) -> AppResult<u64>
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        let count = match &self.txn {
            Some(txn) => select.count(txn).await?,
            None => select.count(&self.db).await?,
        };
        Ok(count)
    }
}

/// Bounded retry of an operation on transient storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStrategy {
    max_retry_count: u32,
    delay: Duration,
}

impl ExecutionStrategy {
    pub fn new(max_retry_count: u32, delay: Duration) -> Self {
        Self {
            max_retry_count,
            delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.db_max_retry_count, config.db_max_retry_delay)
    }

    /// Run once, never retry.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retry_count(&self) -> u32 {
        self.max_retry_count
    }

    /// Run `operation`, replaying it while it fails transiently.
    ///
    /// Non-transient failures return immediately. Once the retries are used
    /// up the last failure is wrapped in `RetriesExhausted`.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempt > self.max_retry_count {
                        return Err(AppError::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retry_count,
                        error = %e,
                        "Transient storage failure, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_DB_MAX_RETRY_COUNT,
            Duration::from_secs(crate::config::DEFAULT_DB_MAX_RETRY_DELAY_SECS),
        )
    }
}

/// Repository factory shared across requests.
#[derive(Clone)]
pub struct Persistence {
    db: DatabaseConnection,
    strategy: ExecutionStrategy,
    clock: Arc<dyn Clock>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection, strategy: ExecutionStrategy) -> Self {
        Self {
            db,
            strategy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for audit stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// A fresh unit of work for `E`, stamping changes as `identity`.
    pub fn repository<E>(&self, identity: Arc<dyn IdentityProvider>) -> Repository<E>
    where
        E: AuditedEntity,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
        E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync + 'static,
    {
        Repository::new(Session::new(self.db.clone()), self.strategy)
            .with_hook(Arc::new(AuditHook::new(identity, self.clock.clone())))
    }
}
