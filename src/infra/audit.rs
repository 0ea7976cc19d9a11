//! Audit stamping and soft-delete conversion.
//!
//! [`AuditHook`] is the pre-commit hook every repository built by
//! `Persistence` carries. It stamps creation and modification metadata and
//! turns deletes into soft deletes. Identity and time are injected so tests
//! can pin both.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, Value};

use super::repositories::{AuditColumns, AuditedEntity, ChangeState, PendingChange, SaveHook};
use crate::config::SYSTEM_ACTOR;
use crate::errors::AppResult;

/// Source of the acting user's name.
pub trait IdentityProvider: Send + Sync {
    fn current_user_name(&self) -> Option<String>;

    /// The name recorded in audit stamps; blank or absent names fall back to
    /// the system actor.
    fn actor(&self) -> String {
        self.current_user_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| SYSTEM_ACTOR.to_string())
    }
}

/// Identity taken from the authenticated request, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity(Option<String>);

impl CallerIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }

    /// No caller; stamps record the system actor.
    pub fn system() -> Self {
        Self(None)
    }
}

impl IdentityProvider for CallerIdentity {
    fn current_user_name(&self) -> Option<String> {
        self.0.clone()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Who changed a row, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Stamps audit columns and converts deletes to soft deletes.
pub struct AuditHook {
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl AuditHook {
    pub fn new(identity: Arc<dyn IdentityProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { identity, clock }
    }

    fn stamp(&self) -> AuditStamp {
        AuditStamp {
            actor: self.identity.actor(),
            at: self.clock.now(),
        }
    }
}

impl<E: AuditedEntity> SaveHook<E> for AuditHook {
    fn before_save(&self, changes: &mut [PendingChange<E::ActiveModel>]) -> AppResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // One stamp for the whole change set
        let stamp = self.stamp();
        let columns = E::audit_columns();

        for change in changes.iter_mut() {
            match change.state {
                ChangeState::Added => stamp_created(&mut change.model, &columns, &stamp)?,
                ChangeState::Modified => stamp_modified(&mut change.model, &columns, &stamp)?,
                ChangeState::Deleted => {
                    stamp_deleted(&mut change.model, &columns, &stamp)?;
                    change.state = ChangeState::Modified;
                }
            }
        }

        Ok(())
    }
}

fn stamp_created<A: ActiveModelTrait>(
    model: &mut A,
    columns: &AuditColumns<<A::Entity as sea_orm::EntityTrait>::Column>,
    stamp: &AuditStamp,
) -> AppResult<()> {
    model.try_set(columns.created_on, Value::from(stamp.at))?;
    model.try_set(columns.created_by, Value::from(stamp.actor.clone()))?;
    model.try_set(columns.is_deleted, Value::from(false))?;
    Ok(())
}

fn stamp_modified<A: ActiveModelTrait>(
    model: &mut A,
    columns: &AuditColumns<<A::Entity as sea_orm::EntityTrait>::Column>,
    stamp: &AuditStamp,
) -> AppResult<()> {
    // Creation metadata is never rewritten
    model.not_set(columns.created_on);
    model.not_set(columns.created_by);
    model.try_set(columns.modified_on, Value::from(Some(stamp.at)))?;
    model.try_set(columns.modified_by, Value::from(Some(stamp.actor.clone())))?;
    Ok(())
}

fn stamp_deleted<A: ActiveModelTrait>(
    model: &mut A,
    columns: &AuditColumns<<A::Entity as sea_orm::EntityTrait>::Column>,
    stamp: &AuditStamp,
) -> AppResult<()> {
    model.not_set(columns.created_on);
    model.not_set(columns.created_by);
    model.try_set(columns.is_deleted, Value::from(true))?;
    model.try_set(columns.deleted_on, Value::from(Some(stamp.at)))?;
    model.try_set(columns.deleted_by, Value::from(Some(stamp.actor.clone())))?;
    Ok(())
}

/// Extension point run for every soft-deleted row, inside the write
/// transaction. Returns the number of dependent rows it touched.
#[async_trait]
pub trait SoftDeleteCascade: Send + Sync {
    async fn cascade(&self, txn: &DatabaseTransaction, parent_id: i32) -> AppResult<u64>;
}

/// No dependent rows are touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCascade;

#[async_trait]
impl SoftDeleteCascade for NoCascade {
    async fn cascade(&self, _txn: &DatabaseTransaction, _parent_id: i32) -> AppResult<u64> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::repositories::entities::category;
    use chrono::TimeZone;
    use sea_orm::ActiveValue::{NotSet, Set, Unchanged};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn hook(identity: CallerIdentity) -> AuditHook {
        AuditHook::new(Arc::new(identity), Arc::new(FixedClock(at())))
    }

    fn change(state: ChangeState, model: category::ActiveModel) -> PendingChange<category::ActiveModel> {
        PendingChange {
            requested: state,
            state,
            key: None,
            expected_version: None,
            model,
        }
    }

    fn loaded() -> category::ActiveModel {
        category::ActiveModel {
            id: Unchanged(1),
            name: Unchanged("Tea".into()),
            other_name: Unchanged("Chai".into()),
            created_on: Unchanged(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            created_by: Unchanged("alice".into()),
            modified_on: Unchanged(None),
            modified_by: Unchanged(None),
            is_deleted: Unchanged(false),
            deleted_on: Unchanged(None),
            deleted_by: Unchanged(None),
            version: Unchanged(1),
        }
    }

    fn run(hook: &AuditHook, changes: &mut [PendingChange<category::ActiveModel>]) {
        SaveHook::<category::Entity>::before_save(hook, changes).unwrap();
    }

    #[test]
    fn test_actor_falls_back_to_system() {
        assert_eq!(CallerIdentity::system().actor(), "System");
        assert_eq!(CallerIdentity::named("  ").actor(), "System");
        assert_eq!(CallerIdentity::named("bob").actor(), "bob");
    }

    #[test]
    fn test_added_gets_creation_stamp() {
        let blank = <category::ActiveModel as Default>::default();
        let mut changes = vec![change(ChangeState::Added, blank)];
        run(&hook(CallerIdentity::named("bob")), &mut changes);

        let model = &changes[0].model;
        assert_eq!(model.created_on, Set(at()));
        assert_eq!(model.created_by, Set("bob".to_string()));
        assert_eq!(model.modified_on, NotSet);
        assert_eq!(changes[0].state, ChangeState::Added);
    }

    #[test]
    fn test_modified_keeps_creation_stamp() {
        let mut changes = vec![change(ChangeState::Modified, loaded())];
        run(&hook(CallerIdentity::system()), &mut changes);

        let model = &changes[0].model;
        assert_eq!(model.modified_on, Set(Some(at())));
        assert_eq!(model.modified_by, Set(Some("System".to_string())));
        assert_eq!(model.created_by, NotSet);
        assert_eq!(model.created_on, NotSet);
    }

    #[test]
    fn test_deleted_becomes_soft_delete() {
        let mut changes = vec![change(ChangeState::Deleted, loaded())];
        run(&hook(CallerIdentity::named("carol")), &mut changes);

        let change = &changes[0];
        assert_eq!(change.state, ChangeState::Modified);
        assert_eq!(change.requested, ChangeState::Deleted);
        assert_eq!(change.model.is_deleted, Set(true));
        assert_eq!(change.model.deleted_on, Set(Some(at())));
        assert_eq!(change.model.deleted_by, Set(Some("carol".to_string())));
    }

    #[test]
    fn test_replay_on_fresh_copy_is_identical() {
        let pristine = vec![change(ChangeState::Deleted, loaded())];
        let hook = hook(CallerIdentity::named("dave"));

        let mut first = pristine.clone();
        run(&hook, &mut first);
        let mut second = pristine.clone();
        run(&hook, &mut second);

        assert_eq!(first[0].model, second[0].model);
        assert_eq!(pristine[0].state, ChangeState::Deleted);
    }
}
