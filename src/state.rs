use sqlx::SqlitePool;

use crate::{
    config::Config,
    utils::{
        email_cache::EmailCache, email_filter::EmailFilter,
        top_students_cache::TopStudentsCache,
    },
};

/// Everything a request handler needs, built once at startup and shared with
/// every worker through `web::Data`.
#[derive(Clone)]
pub struct AppContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub email_filter: EmailFilter,
    pub email_cache: EmailCache,
    pub top_students: TopStudentsCache,
}

impl AppContext {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let top_students = TopStudentsCache::new(config.top_students_cache_ttl);
        Self {
            pool,
            config,
            email_filter: EmailFilter::default(),
            email_cache: EmailCache::default(),
            top_students,
        }
    }

    /// Fills the email filter and cache from the database.
    pub async fn warmup(&self) {
        if let Err(e) = self.email_filter.warmup(&self.pool, 100).await {
            tracing::warn!(error = %e, "Failed to warmup email filter");
        }
        // last 30 days of recent users in batches of 250
        if let Err(e) = self.email_cache.warmup(&self.pool, 30, 250).await {
            tracing::warn!(error = %e, "Failed to warmup email cache");
        }
    }
}
