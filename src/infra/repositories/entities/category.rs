//! Category entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::infra::repositories::{AuditColumns, AuditedEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub other_name: String,
    pub created_on: DateTimeUtc,
    pub created_by: String,
    pub modified_on: Option<DateTimeUtc>,
    pub modified_by: Option<String>,
    pub is_deleted: bool,
    pub deleted_on: Option<DateTimeUtc>,
    pub deleted_by: Option<String>,
    /// Optimistic concurrency token, bumped on every write
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl AuditedEntity for Entity {
    fn audit_columns() -> AuditColumns<Column> {
        AuditColumns {
            id: Column::Id,
            created_on: Column::CreatedOn,
            created_by: Column::CreatedBy,
            modified_on: Column::ModifiedOn,
            modified_by: Column::ModifiedBy,
            is_deleted: Column::IsDeleted,
            deleted_on: Column::DeletedOn,
            deleted_by: Column::DeletedBy,
            version: Column::Version,
        }
    }
}
