// SQLite load history: one row per sampling cycle, read back as a bounded window.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Append-only store of per-cycle load values.
#[async_trait]
pub trait MetricStore: Send + Sync {
    async fn append_load(&self, at: DateTime<Utc>, load: f64) -> anyhow::Result<()>;

    /// The `limit` most recent values, oldest first.
    async fn recent_loads(&self, limit: u32) -> anyhow::Result<Vec<f64>>;

    /// Drops rows past the retention window. Returns how many were deleted.
    async fn prune_old_data(&self) -> anyhow::Result<u64>;
}

pub struct HistoryRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl HistoryRepo {
    pub async fn connect(
        path: &str,
        max_pool_size: u32,
        retention_days: u32,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        let retention_ms = (retention_days as i64) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cpu_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                load REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cpu_metrics_created_at ON cpu_metrics(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cpu_metrics")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl MetricStore for HistoryRepo {
    /// Each write checks out its own pooled connection and returns it when done.
    #[instrument(skip(self), fields(repo = "history", operation = "append_load"))]
    async fn append_load(&self, at: DateTime<Utc>, load: f64) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("INSERT INTO cpu_metrics (created_at, load) VALUES ($1, $2)")
            .bind(at.timestamp_millis())
            .bind(load)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "history", operation = "recent_loads"))]
    async fn recent_loads(&self, limit: u32) -> anyhow::Result<Vec<f64>> {
        let mut rows = sqlx::query_scalar::<_, f64>(
            "SELECT load FROM cpu_metrics ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.reverse();
        Ok(rows)
    }

    #[instrument(skip(self), fields(repo = "history", operation = "prune_old_data"))]
    async fn prune_old_data(&self) -> anyhow::Result<u64> {
        let cutoff = Utc::now().timestamp_millis() - self.retention_ms;
        let r = sqlx::query("DELETE FROM cpu_metrics WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }
}
