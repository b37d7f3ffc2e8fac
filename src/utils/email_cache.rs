use anyhow::Result;
use chrono::{Duration as Days, Utc};
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::SqlitePool;
use std::time::Duration;

/// Recently seen emails that are known to be registered.
#[derive(Clone)]
pub struct EmailCache {
    taken: Cache<String, bool>,
}

impl Default for EmailCache {
    fn default() -> Self {
        Self {
            taken: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }
}

impl EmailCache {
    /// Mark a single email as taken
    pub async fn mark_taken(&self, email: &str) {
        self.taken.insert(email.trim().to_lowercase(), true).await;
    }

    pub async fn is_taken(&self, email: &str) -> bool {
        self.taken
            .get(&email.trim().to_lowercase())
            .await
            .unwrap_or(false)
    }

    async fn batch_mark(&self, emails: &[String]) {
        let futures: Vec<_> = emails
            .iter()
            .map(|e| self.taken.insert(e.to_lowercase(), true))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Load only emails of users that signed in during the last `days` days
    pub async fn warmup(&self, pool: &SqlitePool, days: i64, batch_size: usize) -> Result<usize> {
        let since = Utc::now() - Days::days(days);
        let mut stream = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT email
            FROM users
            WHERE last_login_at >= ?
            ORDER BY last_login_at DESC
            "#,
        )
        .bind(since)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row?;
            batch.push(email);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_mark(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.batch_mark(&batch).await;
        }

        log::info!(
            "Email cache warmup complete: {} recent users (last {} days)",
            total_count,
            days
        );

        Ok(total_count)
    }
}
