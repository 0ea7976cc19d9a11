//! Category domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::NAME_MAX_LENGTH;
use crate::infra::repositories::entities::category::{self, Column};
use crate::types::{SortableField, SortableResource};

/// Category domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub other_name: String,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    pub modified_on: Option<DateTime<Utc>>,
    pub modified_by: Option<String>,
    pub version: i32,
}

impl From<category::Model> for Category {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            other_name: model.other_name,
            created_on: model.created_on,
            created_by: model.created_by,
            modified_on: model.modified_on,
            modified_by: model.modified_by,
            version: model.version,
        }
    }
}

/// Category as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResource {
    pub id: i32,
    pub name: String,
    pub other_name: String,
    pub version: i32,
}

impl From<Category> for CategoryResource {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            other_name: category.other_name,
            version: category.version,
        }
    }
}

impl SortableResource for CategoryResource {
    type Column = Column;

    const SORTABLE_FIELDS: &'static [SortableField<Column>] = &[
        SortableField {
            name: "Name",
            column: Column::Name,
        },
        SortableField {
            name: "OtherName",
            column: Column::OtherName,
        },
    ];
}

/// Create/update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryModel {
    #[validate(length(max = "NAME_MAX_LENGTH", message = "Name can not be longer than 200 characters."))]
    #[serde(default)]
    pub name: String,

    #[validate(length(
        max = "NAME_MAX_LENGTH",
        message = "OtherName can not be longer than 200 characters."
    ))]
    #[serde(default)]
    pub other_name: String,

    /// Version the client last read; stale values are rejected on update
    #[serde(default)]
    pub version: Option<i32>,
}

impl CategoryModel {
    pub fn new(name: impl Into<String>, other_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            other_name: other_name.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }
}

/// Business filter for category listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListFilter {
    /// Matches when either name contains the value
    pub name: Option<String>,
}
