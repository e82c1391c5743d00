use anyhow::{Result, anyhow};
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::OnceCell;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const MAX_CAPACITY: u64 = 100_000;

/// employee code => known to exist.
/// Only positives are stored; a miss always falls through to the database.
static EMPLOYEE_CACHE: OnceCell<Cache<String, bool>> = OnceCell::new();

fn build(ttl: Duration) -> Cache<String, bool> {
    Cache::builder()
        .max_capacity(MAX_CAPACITY)
        .time_to_live(ttl)
        .build()
}

fn cache() -> &'static Cache<String, bool> {
    EMPLOYEE_CACHE.get_or_init(|| build(DEFAULT_TTL))
}

/// Sets the entry TTL. Must run before the first lookup, later calls are ignored.
pub fn init(ttl: Duration) {
    if EMPLOYEE_CACHE.set(build(ttl)).is_err() {
        debug!("Employee cache already initialised");
    }
}

pub async fn mark_known(employee_id: &str) {
    cache().insert(employee_id.to_string(), true).await;
}

pub async fn is_known(employee_id: &str) -> bool {
    cache().get(employee_id).await.unwrap_or(false)
}

/// Drop an employee code, e.g. after delete or a code change
pub async fn forget(employee_id: &str) {
    cache().invalidate(employee_id).await;
}

/// Cache first, then the database. A database hit is cached.
pub async fn employee_exists(pool: &MySqlPool, employee_id: &str) -> Result<bool, sqlx::Error> {
    if is_known(employee_id).await {
        return Ok(true);
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE employee_id = ?")
        .bind(employee_id)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        mark_known(employee_id).await;
        return Ok(true);
    }

    Ok(false)
}

async fn batch_mark(employee_ids: &[String]) {
    let futures: Vec<_> = employee_ids
        .iter()
        .map(|id| cache().insert(id.clone(), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load the most recently created employee codes, streamed in batches
pub async fn warmup_employee_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let batch_size = batch_size.max(1);
    let mut stream = sqlx::query_as::<_, (String,)>(
        "SELECT employee_id FROM employees ORDER BY created_at DESC LIMIT ?",
    )
    .bind(MAX_CAPACITY)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (employee_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(employee_id);
        total += 1;

        if batch.len() == batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    info!(total, "Employee cache warmup complete");
    Ok(())
}
