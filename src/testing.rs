//! In-memory stand-ins for the MongoDB and InfluxDB handles

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::db::{StoreError, UserStore};
use crate::metrics::{Metrics, MetricsError, MetricsSink, Point};
use crate::models::{NewUser, User};
use crate::AppState;

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn users(&self) -> Vec<User> {
        self.users.lock().clone()
    }

    /// Make every subsequent operation fail
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Timeout(std::time::Duration::from_secs(10)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        Ok(self.users())
    }

    async fn insert_many(&self, users: Vec<NewUser>) -> Result<Vec<String>, StoreError> {
        self.check()?;
        let mut stored = self.users.lock();
        let mut ids = Vec::with_capacity(users.len());
        for user in users {
            let id = format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            ids.push(id.clone());
            stored.push(User {
                id,
                name: user.name,
                email: user.email,
                username: user.username,
            });
        }
        Ok(ids)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        self.check()?;
        let mut stored = self.users.lock();
        let count = stored.len() as u64;
        stored.clear();
        Ok(count)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    points: Mutex<Vec<Point>>,
    failing: bool,
}

impl RecordingSink {
    /// A sink that rejects every write
    pub fn failing() -> Self {
        Self {
            points: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn points(&self) -> Vec<Point> {
        self.points.lock().clone()
    }

    pub fn points_for(&self, measurement: &str) -> Vec<Point> {
        self.points
            .lock()
            .iter()
            .filter(|p| p.measurement == measurement)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn write(&self, point: Point) -> Result<(), MetricsError> {
        if self.failing {
            return Err(MetricsError::Server {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.points.lock().push(point);
        Ok(())
    }
}

pub fn test_state(store: Arc<MemoryUserStore>, sink: Arc<RecordingSink>) -> Arc<AppState> {
    Arc::new(AppState {
        users: store,
        metrics: Metrics::new(sink),
    })
}
