//! Repository trait for tournament and draft snapshots.
//!
//! Both aggregates are stored whole, as JSON. A draft write is one upsert, so
//! a failed write can never leave half a round behind.

use async_trait::async_trait;
use sqlx::{PgPool, Row, types::Json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::draft::Draft;
use crate::tournament::models::{DraftId, Tournament, TournamentId};

/// Default timeout for a single snapshot query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Query did not finish in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored data contradicts itself
    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
}

/// Result type for repository operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Run a query with a timeout
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StorageResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StorageError::Timeout(duration)),
    }
}

/// Storage for tournament registries and draft aggregates
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Insert or replace the tournament registry
    async fn save_tournament(&self, tournament: &Tournament) -> StorageResult<()>;

    /// Load a tournament registry
    async fn load_tournament(&self, id: TournamentId) -> StorageResult<Option<Tournament>>;

    /// Insert or replace a draft snapshot
    async fn save_draft(&self, tournament_id: TournamentId, draft: &Draft) -> StorageResult<()>;

    /// Load every draft of a tournament, ordered by draft ID
    async fn load_drafts(&self, tournament_id: TournamentId) -> StorageResult<Vec<Draft>>;
}

/// In-memory repository.
///
/// Snapshots go through JSON exactly as they would for PostgreSQL, so a type
/// that does not round-trip fails here too.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tournaments: RwLock<HashMap<TournamentId, String>>,
    drafts: RwLock<HashMap<(TournamentId, DraftId), String>>,
    failing_writes: AtomicUsize,
    failing_tournament_writes: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` tournament writes fail; draft writes still succeed
    pub fn fail_next_tournament_writes(&self, count: usize) {
        self.failing_tournament_writes.store(count, Ordering::SeqCst);
    }

    fn injected_failure(&self) -> StorageResult<()> {
        take_failure(&self.failing_writes)
    }
}

fn take_failure(counter: &AtomicUsize) -> StorageResult<()> {
    let fail = counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if fail {
        return Err(StorageError::Timeout(Duration::ZERO));
    }
    Ok(())
}

#[async_trait]
impl DraftRepository for MemoryRepository {
    async fn save_tournament(&self, tournament: &Tournament) -> StorageResult<()> {
        self.injected_failure()?;
        take_failure(&self.failing_tournament_writes)?;
        let json = serde_json::to_string(tournament)?;
        self.tournaments.write().await.insert(tournament.id, json);
        Ok(())
    }

    async fn load_tournament(&self, id: TournamentId) -> StorageResult<Option<Tournament>> {
        let tournaments = self.tournaments.read().await;
        tournaments
            .get(&id)
            .map(|json| serde_json::from_str(json))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn save_draft(&self, tournament_id: TournamentId, draft: &Draft) -> StorageResult<()> {
        self.injected_failure()?;
        let json = serde_json::to_string(draft)?;
        self.drafts
            .write()
            .await
            .insert((tournament_id, draft.id), json);
        Ok(())
    }

    async fn load_drafts(&self, tournament_id: TournamentId) -> StorageResult<Vec<Draft>> {
        let drafts = self.drafts.read().await;
        let mut loaded = drafts
            .iter()
            .filter(|((tid, _), _)| *tid == tournament_id)
            .map(|(_, json)| serde_json::from_str::<Draft>(json))
            .collect::<Result<Vec<_>, _>>()?;
        loaded.sort_by_key(|d| d.id);
        Ok(loaded)
    }
}

/// PostgreSQL repository storing `jsonb` snapshots
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DraftRepository for PgRepository {
    async fn save_tournament(&self, tournament: &Tournament) -> StorageResult<()> {
        with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(
                "INSERT INTO tournaments (id, name, snapshot, updated_at)
                 VALUES ($1, $2, $3, NOW())
                 ON CONFLICT (id) DO UPDATE
                 SET name = EXCLUDED.name, snapshot = EXCLUDED.snapshot, updated_at = NOW()",
            )
            .bind(tournament.id)
            .bind(&tournament.name)
            .bind(Json(tournament))
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn load_tournament(&self, id: TournamentId) -> StorageResult<Option<Tournament>> {
        let row = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query("SELECT snapshot FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => {
                let snapshot: serde_json::Value = row.try_get("snapshot")?;
                let tournament: Tournament = serde_json::from_value(snapshot)?;
                if tournament.id != id {
                    return Err(StorageError::Corrupt(format!(
                        "tournament row {id} holds tournament {}",
                        tournament.id
                    )));
                }
                Ok(Some(tournament))
            }
            None => Ok(None),
        }
    }

    async fn save_draft(&self, tournament_id: TournamentId, draft: &Draft) -> StorageResult<()> {
        with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(
                "INSERT INTO drafts (tournament_id, id, snapshot, updated_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (tournament_id, id) DO UPDATE
                 SET snapshot = EXCLUDED.snapshot, updated_at = EXCLUDED.updated_at",
            )
            .bind(tournament_id)
            .bind(draft.id)
            .bind(Json(draft))
            .bind(draft.updated_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn load_drafts(&self, tournament_id: TournamentId) -> StorageResult<Vec<Draft>> {
        let rows = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query("SELECT id, snapshot FROM drafts WHERE tournament_id = $1 ORDER BY id")
                .bind(tournament_id)
                .fetch_all(&self.pool),
        )
        .await?;

        rows.into_iter()
            .map(|row| {
                let id: DraftId = row.try_get("id")?;
                let snapshot: serde_json::Value = row.try_get("snapshot")?;
                let draft: Draft = serde_json::from_value(snapshot)?;
                if draft.id != id {
                    return Err(StorageError::Corrupt(format!(
                        "draft row {id} holds draft {}",
                        draft.id
                    )));
                }
                Ok(draft)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{DraftConfig, Pronouns};

    #[tokio::test]
    async fn test_memory_round_trip() {
        let repo = MemoryRepository::new();
        let mut tournament = Tournament::new(7, "Cube Open");
        let alice = tournament.enroll("Alice", Pronouns::SheHer);
        repo.save_tournament(&tournament).await.unwrap();

        let config = DraftConfig::new("Vintage", 1, vec![alice]);
        let player = tournament.player(alice).cloned().unwrap();
        let draft = Draft::new(3, &config, vec![player]);
        repo.save_draft(7, &draft).await.unwrap();

        let loaded = repo.load_tournament(7).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Cube Open");
        assert_eq!(loaded.players.len(), 1);

        let drafts = repo.load_drafts(7).await.unwrap();
        assert_eq!(drafts, vec![draft]);
        assert!(repo.load_drafts(8).await.unwrap().is_empty());
        assert!(repo.load_tournament(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_write_failures() {
        let repo = MemoryRepository::new();
        let tournament = Tournament::new(1, "Cube Open");

        repo.fail_next_writes(2);
        assert!(repo.save_tournament(&tournament).await.is_err());
        assert!(repo.save_tournament(&tournament).await.is_err());
        assert!(repo.save_tournament(&tournament).await.is_ok());
    }

    #[tokio::test]
    async fn test_tournament_write_failures_spare_drafts() {
        let repo = MemoryRepository::new();
        let mut tournament = Tournament::new(1, "Cube Open");
        let alice = tournament.enroll("Alice", Pronouns::SheHer);
        let config = DraftConfig::new("Vintage", 1, vec![alice]);
        let player = tournament.player(alice).cloned().unwrap();
        let draft = Draft::new(1, &config, vec![player]);

        repo.fail_next_tournament_writes(1);
        assert!(repo.save_draft(1, &draft).await.is_ok());
        assert!(repo.save_tournament(&tournament).await.is_err());
        assert!(repo.save_tournament(&tournament).await.is_ok());
    }

    #[test]
    fn test_timeout_error_display() {
        let err = StorageError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("5s"));
    }
}
