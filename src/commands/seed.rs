//! Seed command - Creates or refreshes reference categories.

use serde::Deserialize;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{
    CallerIdentity, CategoryRepository, CategoryStore, Database, ExecutionStrategy, Persistence,
};

const CATEGORIES: &str = include_str!("data/categories.json");

/// One reference category
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCategory {
    pub name: String,
    pub other_name: String,
}

/// What a seeding run changed
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// The embedded reference data set.
pub fn reference_categories() -> AppResult<Vec<SeedCategory>> {
    serde_json::from_str(CATEGORIES)
        .map_err(|e| AppError::internal(format!("Invalid reference data: {}", e)))
}

/// Create missing categories and align `other_name` on existing ones.
///
/// Runs as the system actor. Soft-deleted categories do not count as
/// existing, so a deleted reference row is recreated.
pub async fn seed_categories(
    repo: &dyn CategoryRepository,
    entries: Vec<SeedCategory>,
) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    for entry in entries {
        match repo.find_by_name(entry.name.clone()).await? {
            None => {
                repo.create(CallerIdentity::system(), entry.name, entry.other_name)
                    .await?;
                summary.created += 1;
            }
            Some(mut existing) if existing.other_name != entry.other_name => {
                existing.other_name = entry.other_name;
                repo.update(CallerIdentity::system(), existing).await?;
                summary.updated += 1;
            }
            Some(_) => summary.unchanged += 1,
        }
    }

    Ok(summary)
}

/// Execute the seed command
pub async fn execute(config: Config) -> AppResult<()> {
    let db = Database::connect(&config).await?;
    let persistence = Persistence::new(db.get_connection(), ExecutionStrategy::from_config(&config));
    let store = CategoryStore::new(persistence);

    let summary = seed_categories(&store, reference_categories()?).await?;
    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        unchanged = summary.unchanged,
        "Reference data seeded"
    );

    Ok(())
}
