use moka::future::Cache;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::model::user::Student;

/// Ranked student listings keyed by the requested limit and the epoch they
/// were loaded in. Invalidation moves to a new epoch, so a listing loaded
/// before an attendance change can never be served after it.
#[derive(Clone)]
pub struct TopStudentsCache {
    listings: Cache<(u32, u64), Arc<Vec<Student>>>,
    epoch: Arc<AtomicU64>,
}

impl TopStudentsCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            listings: Cache::builder()
                .max_capacity(128)
                .time_to_live(Duration::from_secs(ttl_secs))
                .build(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Read this before loading a listing and hand it back to `put`.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub async fn get(&self, limit: u32) -> Option<Arc<Vec<Student>>> {
        self.listings.get(&(limit, self.epoch())).await
    }

    /// Stores a listing loaded during `epoch`. A stale epoch is dropped.
    pub async fn put(&self, limit: u32, epoch: u64, students: Arc<Vec<Student>>) {
        if epoch != self.epoch() {
            tracing::debug!(limit, epoch, "Discarding top students loaded before an invalidation");
            return;
        }
        self.listings.insert((limit, epoch), students).await;
    }

    /// Drop every listing; called whenever an attendance record changes.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.listings.invalidate_all();
    }
}
