//! Profile reveal repository.

use std::sync::Arc;

use pitchlane_common::AppResult;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter,
};

use super::{read_err, write_err};
use crate::entities::{profile_reveal, ProfileReveal};

/// Profile reveal repository for database operations.
#[derive(Clone)]
pub struct RevealRepository {
    db: Arc<DatabaseConnection>,
}

impl RevealRepository {
    /// Create a new reveal repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the reveal fact for an investor/founder pair.
    pub async fn find_by_pair(
        &self,
        investor_id: &str,
        founder_id: &str,
    ) -> AppResult<Option<profile_reveal::Model>> {
        ProfileReveal::find()
            .filter(profile_reveal::Column::InvestorId.eq(investor_id))
            .filter(profile_reveal::Column::FounderId.eq(founder_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Check whether the investor is revealed to the founder.
    pub async fn is_revealed(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(investor_id, founder_id).await?.is_some())
    }

    /// Record a reveal. An existing fact for the pair is left untouched.
    pub async fn upsert<C: ConnectionTrait>(
        conn: &C,
        model: profile_reveal::Model,
    ) -> AppResult<()> {
        ProfileReveal::insert(model.into_active_model())
            .on_conflict(
                OnConflict::columns([
                    profile_reveal::Column::InvestorId,
                    profile_reveal::Column::FounderId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_upsert_tolerates_existing_pair() {
        // ON CONFLICT DO NOTHING reports zero affected rows for a repeat.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let reveal = profile_reveal::Model {
            id: "r1".to_string(),
            investor_id: "inv".to_string(),
            founder_id: "fdr".to_string(),
            created_at: Utc::now(),
        };

        assert!(RevealRepository::upsert(&db, reveal).await.is_ok());
    }

    #[tokio::test]
    async fn test_is_revealed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile_reveal::Model>::new()])
                .into_connection(),
        );

        let repo = RevealRepository::new(db);
        assert!(!repo.is_revealed("inv", "fdr").await.unwrap());
    }
}
