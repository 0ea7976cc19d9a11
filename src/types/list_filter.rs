//! Skip/take/order-by query parameters shared by every list endpoint.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::QuerySelect;
use serde::Deserialize;
use validator::Validate;

use crate::config::{DEFAULT_SKIP, DEFAULT_TAKE, ORDER_BY_ALLOWED_PATTERN, VALIDATION_FAILED_MESSAGE};
use crate::errors::{validation_bag, AppError, AppResult, ErrorDetails};

static ORDER_BY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(ORDER_BY_ALLOWED_PATTERN).expect("order-by pattern is valid"));

/// Paging and ordering parameters (reusable across all list endpoints)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    /// Rows to skip before the first returned row
    #[validate(range(min = 0, message = "The field skip must be between 0 and 2147483647."))]
    pub skip: Option<i32>,

    /// Maximum rows to return
    #[validate(range(min = 1, max = 9999, message = "The field take must be between 1 and 9999."))]
    pub take: Option<i32>,

    /// Comma separated sort keys, e.g. `+Name,-OtherName`
    #[validate(regex(
        path = *ORDER_BY_REGEX,
        message = "Only letters, numbers and '+', '-', ',', '.', are allowed for order by property."
    ))]
    pub order_by: Option<String>,
}

impl ListFilter {
    /// Validate the filter and derive the paging window.
    ///
    /// All failures are reported together in one `InvalidModel` error.
    pub fn paging(&self) -> AppResult<Paging> {
        let mut details = ErrorDetails::new(VALIDATION_FAILED_MESSAGE);

        if let Err(errors) = self.validate() {
            details.extend(validation_bag(&errors));
        }

        if let (Some(skip), Some(take)) = (self.skip, self.take) {
            if skip.checked_add(take).is_none() {
                let message = format!("Sum of skip and take cannot be greater than {}", i32::MAX);
                details.push("skip", message.clone());
                details.push("take", message);
            }
        }

        if !details.is_empty() {
            return Err(AppError::InvalidModel(details));
        }

        Ok(Paging {
            skip: self.skip.map(|s| s as u64).unwrap_or(DEFAULT_SKIP),
            take: self.take.map(|t| t as u64).unwrap_or(DEFAULT_TAKE),
        })
    }

    /// The raw order-by expression, empty when absent.
    pub fn order_by(&self) -> &str {
        self.order_by.as_deref().unwrap_or_default()
    }
}

/// A validated skip/take window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub skip: u64,
    pub take: u64,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            take: DEFAULT_TAKE,
        }
    }
}

impl Paging {
    pub fn new(skip: u64, take: u64) -> Self {
        Self { skip, take }
    }

    /// Apply the window. Must be the last step of query composition.
    pub fn apply<Q: QuerySelect>(&self, query: Q) -> Q {
        query.offset(self.skip).limit(self.take)
    }
}
