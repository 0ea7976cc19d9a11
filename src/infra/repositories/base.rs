//! Generic repository over audited, soft-deletable entities.
//!
//! Reads compose `is_deleted = false`, the caller's predicates, an optional
//! include step, the ordering and finally the paging window. Writes are
//! queued as a change set and only touch storage in [`Repository::save`],
//! which runs the registered pre-commit hooks and writes every change in one
//! transaction.

use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, IntoActiveModel,
    QueryFilter, Select, TransactionTrait, Value,
};

use crate::errors::{AppError, AppResult};
use crate::infra::audit::{NoCascade, SoftDeleteCascade};
use crate::infra::unit_of_work::{ExecutionStrategy, Session};
use crate::types::{OrderBy, Paging, Predicates};

/// Storage columns every audited entity carries.
#[derive(Debug, Clone, Copy)]
pub struct AuditColumns<C> {
    pub id: C,
    pub created_on: C,
    pub created_by: C,
    pub modified_on: C,
    pub modified_by: C,
    pub is_deleted: C,
    pub deleted_on: C,
    pub deleted_by: C,
    pub version: C,
}

/// Entities with an integer id, audit stamps, a soft-delete flag and a
/// version column.
pub trait AuditedEntity: EntityTrait {
    fn audit_columns() -> AuditColumns<Self::Column>;
}

/// What the caller asked for, and what will be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    Added,
    Modified,
    Deleted,
}

/// One queued change.
///
/// `requested` never changes after capture; hooks rewrite `state` and
/// `model`.
#[derive(Debug, Clone)]
pub struct PendingChange<A> {
    pub requested: ChangeState,
    pub state: ChangeState,
    pub model: A,
    pub key: Option<i32>,
    pub expected_version: Option<i32>,
}

/// Runs inside `save()` before anything is written.
///
/// Hooks receive a fresh copy of the change set on every attempt, so a
/// replayed save never sees the effects of an earlier one.
pub trait SaveHook<E: EntityTrait>: Send + Sync {
    fn before_save(&self, changes: &mut [PendingChange<E::ActiveModel>]) -> AppResult<()>;
}

/// Select transformation applied after filtering, e.g. joins.
pub type Include<E> = Arc<dyn Fn(Select<E>) -> Select<E> + Send + Sync>;

/// Everything `list()` needs to shape a query.
pub struct ListQuery<E: EntityTrait> {
    pub predicates: Predicates,
    pub order: OrderBy<E::Column>,
    pub paging: Paging,
    pub include: Option<Include<E>>,
}

impl<E: EntityTrait> Default for ListQuery<E> {
    fn default() -> Self {
        Self {
            predicates: Predicates::default(),
            order: OrderBy::default(),
            paging: Paging::default(),
            include: None,
        }
    }
}

impl<E: EntityTrait> ListQuery<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicates: Predicates) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn order(mut self, order: OrderBy<E::Column>) -> Self {
        self.order = order;
        self
    }

    pub fn paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }

    pub fn include(mut self, include: Include<E>) -> Self {
        self.include = Some(include);
        self
    }
}

/// Rows written by a successful `save()`, in change-set order.
#[derive(Debug)]
pub struct Committed<M> {
    pub models: Vec<M>,
}

impl<M> Default for Committed<M> {
    fn default() -> Self {
        Self { models: Vec::new() }
    }
}

impl<M> Committed<M> {
    pub fn count(&self) -> usize {
        self.models.len()
    }
}

/// Unit of work over one entity type.
pub struct Repository<E: EntityTrait> {
    session: Session,
    pending: Vec<PendingChange<E::ActiveModel>>,
    hooks: Vec<Arc<dyn SaveHook<E>>>,
    cascade: Arc<dyn SoftDeleteCascade>,
    strategy: ExecutionStrategy,
}

impl<E> Repository<E>
where
    E: AuditedEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync + 'static,
{
    pub fn new(session: Session, strategy: ExecutionStrategy) -> Self {
        Self {
            session,
            pending: Vec::new(),
            hooks: Vec::new(),
            cascade: Arc::new(NoCascade),
            strategy,
        }
    }

    /// Register a pre-commit hook. Hooks run in registration order.
    pub fn with_hook(mut self, hook: Arc<dyn SaveHook<E>>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_cascade(mut self, cascade: Arc<dyn SoftDeleteCascade>) -> Self {
        self.cascade = cascade;
        self
    }

    fn live(&self) -> Select<E> {
        E::find().filter(E::audit_columns().is_deleted.eq(false))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Filter, include, sort, then page. Soft-deleted rows never match.
    pub async fn list(&self, query: ListQuery<E>) -> AppResult<Vec<E::Model>> {
        let ListQuery {
            predicates,
            order,
            paging,
            include,
        } = query;

        let mut select = predicates.apply(self.live());
        if let Some(include) = include {
            select = include(select);
        }
        let select = paging.apply(order.apply(select));

        self.session.all(select).await
    }

    /// Find a live row by id.
    pub async fn get_by_id(&self, id: i32, include: Option<Include<E>>) -> AppResult<Option<E::Model>> {
        let mut select = self.live().filter(E::audit_columns().id.eq(id));
        if let Some(include) = include {
            select = include(select);
        }
        self.session.one(select).await
    }

    pub async fn exists(&self, predicates: Predicates) -> AppResult<bool> {
        Ok(self.session.one(predicates.apply(self.live())).await?.is_some())
    }

    pub async fn count(&self, predicates: Predicates) -> AppResult<u64> {
        self.session.count(predicates.apply(self.live())).await
    }

    // =========================================================================
    // Change set
    // =========================================================================

    /// Queue an insert.
    pub fn add(&mut self, model: impl IntoActiveModel<E::ActiveModel>) {
        self.track(ChangeState::Added, model.into_active_model());
    }

    /// Queue an update. The model's `version`, when present, is the version
    /// the caller expects storage to still hold.
    pub fn update(&mut self, model: impl IntoActiveModel<E::ActiveModel>) {
        self.track(ChangeState::Modified, model.into_active_model());
    }

    /// Queue a delete. It is written as a soft delete.
    pub fn delete(&mut self, model: impl IntoActiveModel<E::ActiveModel>) {
        self.track(ChangeState::Deleted, model.into_active_model());
    }

    fn track(&mut self, state: ChangeState, model: E::ActiveModel) {
        let columns = E::audit_columns();
        self.pending.push(PendingChange {
            requested: state,
            state,
            key: int_value(&model, columns.id),
            expected_version: int_value(&model, columns.version),
            model,
        });
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Discard queued changes without writing.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Write the change set.
    ///
    /// Inside an explicit transaction the changes go into it once, without
    /// retry and without committing. Otherwise each attempt opens and commits
    /// its own transaction and transient failures are replayed by the
    /// execution strategy. The queue is cleared only on success.
    pub async fn save(&mut self) -> AppResult<Committed<E::Model>> {
        if self.pending.is_empty() {
            return Ok(Committed::default());
        }

        let hooks = self.hooks.as_slice();
        let cascade = self.cascade.as_ref();
        let pending = self.pending.as_slice();

        let models = match self.session.transaction() {
            Some(txn) => write_changes::<E>(txn, hooks, cascade, pending).await?,
            None => {
                let db = self.session.connection();
                self.strategy
                    .execute(move || async move {
                        let txn = db.begin().await?;
                        match write_changes::<E>(&txn, hooks, cascade, pending).await {
                            Ok(models) => {
                                txn.commit().await?;
                                Ok(models)
                            }
                            Err(e) => {
                                if let Err(rollback_err) = txn.rollback().await {
                                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                                }
                                Err(e)
                            }
                        }
                    })
                    .await?
            }
        };

        self.pending.clear();
        tracing::debug!(
            table = E::default().table_name(),
            rows = models.len(),
            "Change set saved"
        );
        Ok(Committed { models })
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub async fn begin_transaction(&mut self) -> AppResult<()> {
        self.session.begin().await
    }

    pub async fn commit_transaction(&mut self) -> AppResult<()> {
        self.session.commit().await
    }

    pub async fn rollback_transaction(&mut self) -> AppResult<()> {
        self.pending.clear();
        self.session.rollback().await
    }

    pub fn has_transaction(&self) -> bool {
        self.session.has_transaction()
    }

    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.strategy
    }
}

async fn write_changes<E>(
    txn: &DatabaseTransaction,
    hooks: &[Arc<dyn SaveHook<E>>],
    cascade: &dyn SoftDeleteCascade,
    pending: &[PendingChange<E::ActiveModel>],
) -> AppResult<Vec<E::Model>>
where
    E: AuditedEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync + 'static,
{
    let mut changes = pending.to_vec();
    for hook in hooks {
        hook.before_save(&mut changes)?;
    }

    let columns = E::audit_columns();
    let mut written = Vec::with_capacity(changes.len());

    for change in changes {
        let requested = change.requested;
        let key = change.key;
        let model = match change.state {
            ChangeState::Added => insert_row::<E>(txn, &columns, change.model).await?,
            ChangeState::Modified | ChangeState::Deleted => {
                update_row::<E>(txn, &columns, change).await?
            }
        };

        if let (ChangeState::Deleted, Some(id)) = (requested, key) {
            let cascaded = cascade.cascade(txn, id).await?;
            tracing::debug!(id, cascaded, "Soft delete cascade applied");
        }

        written.push(model);
    }

    Ok(written)
}

async fn insert_row<E>(
    txn: &DatabaseTransaction,
    columns: &AuditColumns<E::Column>,
    mut model: E::ActiveModel,
) -> AppResult<E::Model>
where
    E: AuditedEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync + 'static,
{
    model.not_set(columns.id);
    model.try_set(columns.version, Value::from(1i32))?;
    model.try_set(columns.is_deleted, Value::from(false))?;
    Ok(model.insert(txn).await?)
}

async fn update_row<E>(
    txn: &DatabaseTransaction,
    columns: &AuditColumns<E::Column>,
    change: PendingChange<E::ActiveModel>,
) -> AppResult<E::Model>
where
    E: AuditedEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync + 'static,
{
    let table = E::default().table_name().to_string();
    let id = change
        .key
        .ok_or_else(|| AppError::internal(format!("{} row has no id to update", table)))?;

    let mut model = change.model;
    if change.state == ChangeState::Deleted {
        model.try_set(columns.is_deleted, Value::from(true))?;
    }
    model.not_set(columns.id);
    model.not_set(columns.version);

    let mut update = E::update_many()
        .set(model)
        .col_expr(columns.version, Expr::col(columns.version).add(1))
        .filter(columns.id.eq(id))
        .filter(columns.is_deleted.eq(false));
    if let Some(version) = change.expected_version {
        update = update.filter(columns.version.eq(version));
    }

    let stale = || {
        AppError::Concurrency(format!(
            "{} row {} was changed or deleted by another operation",
            table, id
        ))
    };

    if update.exec(txn).await?.rows_affected == 0 {
        return Err(stale());
    }

    E::find()
        .filter(columns.id.eq(id))
        .one(txn)
        .await?
        .ok_or_else(stale)
}

fn int_value<A: ActiveModelTrait>(
    model: &A,
    column: <A::Entity as EntityTrait>::Column,
) -> Option<i32> {
    match model.get(column).into_value() {
        Some(Value::Int(Some(v))) => Some(v),
        _ => None,
    }
}
