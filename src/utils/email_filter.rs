use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use sqlx::SqlitePool;
use std::sync::{Arc, PoisonError, RwLock};

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Probabilistic set of registered emails. A negative answer is exact, a
/// positive one must be confirmed elsewhere.
#[derive(Clone)]
pub struct EmailFilter {
    inner: Arc<RwLock<CuckooFilter<String>>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CuckooFilter::new(
                FILTER_CAPACITY,
                FALSE_POSITIVE_RATE,
            ))),
        }
    }
}

impl EmailFilter {
    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    pub fn insert(&self, email: &str) {
        let email = normalize(email);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
    }

    /// Warm up the filter using streaming + batching
    pub async fn warmup(&self, pool: &SqlitePool, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push(normalize(&email));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        log::info!("Email filter warmup complete: {} users", total);
        Ok(total)
    }

    /// Insert a batch of normalized emails
    fn insert_batch(&self, emails: &[String]) {
        let mut filter = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        for email in emails {
            filter.add(email);
        }
    }
}
