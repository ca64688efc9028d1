#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use draftsheet::errors::{AppError, AppResult};
use draftsheet::{DraftRow, DraftStore, EngineConfig};

/// Scripted in-memory store for engine tests: records every call, can
/// delay or fail individual upserts, and hands out sequential identities.
pub struct MockStore {
    next_id: AtomicI64,
    pub upserts: Mutex<Vec<DraftRow>>,
    pub deletes: Mutex<Vec<i64>>,
    pub rows: Mutex<HashMap<i64, DraftRow>>,
    delays: Mutex<VecDeque<Duration>>,
    failures: Mutex<VecDeque<bool>>,
}

impl MockStore {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            next_id: AtomicI64::new(1),
            upserts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            rows: Mutex::new(HashMap::new()),
            delays: Mutex::new(VecDeque::new()),
            failures: Mutex::new(VecDeque::new()),
        })
    }

    /// Next upsert sleeps this long before resolving.
    pub fn push_delay(&self, d: Duration) {
        self.delays.lock().unwrap().push_back(d);
    }

    /// Next upsert fails with a persistence error.
    pub fn fail_next(&self) {
        self.failures.lock().unwrap().push_back(true);
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    /// Plant a persisted row directly, as if from an earlier session.
    pub fn seed(&self, row: DraftRow) {
        let id = row.id.expect("seeded rows need an id");
        self.rows.lock().unwrap().insert(id, row);
    }
}

fn minutes(t: &str) -> i64 {
    let (h, m) = t.split_once(':').expect("HH:MM");
    h.parse::<i64>().unwrap() * 60 + m.parse::<i64>().unwrap()
}

#[async_trait]
impl DraftStore for MockStore {
    async fn upsert(&self, row: &DraftRow) -> AppResult<DraftRow> {
        self.upserts.lock().unwrap().push(row.clone());
        let delay = self.delays.lock().unwrap().pop_front();
        let fail = self.failures.lock().unwrap().pop_front().unwrap_or(false);

        if let Some(d) = delay
            && !d.is_zero()
        {
            tokio::time::sleep(d).await;
        }
        if fail {
            return Err(AppError::Persistence(
                "mock store rejected the write".to_string(),
            ));
        }

        let mut canonical = row.clone();
        if canonical.id.is_none() {
            canonical.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst));
        }
        canonical.hours =
            Some((minutes(&canonical.time_out) - minutes(&canonical.time_in)) as f64 / 60.0);
        self.rows
            .lock()
            .unwrap()
            .insert(canonical.id.unwrap(), canonical.clone());
        Ok(canonical)
    }

    async fn delete(&self, id: i64) -> AppResult<usize> {
        self.deletes.lock().unwrap().push(id);
        let removed = self.rows.lock().unwrap().remove(&id).is_some();
        Ok(usize::from(removed))
    }

    async fn load_all(&self) -> AppResult<Vec<DraftRow>> {
        let mut rows: Vec<DraftRow> = self.rows.lock().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| (&a.date, &a.time_in).cmp(&(&b.date, &b.time_in)));
        Ok(rows)
    }
}

/// Log engine decisions when a test needs explaining.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Short timings so tests stay readable: 100ms debounce, 50ms status hold.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        debounce: Duration::from_millis(100),
        min_syncing: Duration::from_millis(50),
    }
}

/// A complete row on a project with no dependent fields.
pub fn train_row(date: &str, time_in: &str, time_out: &str, desc: &str) -> DraftRow {
    DraftRow {
        id: None,
        date: date.to_string(),
        time_in: time_in.to_string(),
        time_out: time_out.to_string(),
        project: "TRAIN".to_string(),
        tool: None,
        charge_code: None,
        task_description: desc.to_string(),
        hours: None,
    }
}

/// A complete row on a project requiring both dependent fields.
pub fn dev_row(date: &str, time_in: &str, time_out: &str, desc: &str) -> DraftRow {
    DraftRow {
        id: None,
        date: date.to_string(),
        time_in: time_in.to_string(),
        time_out: time_out.to_string(),
        project: "DEV".to_string(),
        tool: Some("CAD".to_string()),
        charge_code: Some("DEV-100".to_string()),
        task_description: desc.to_string(),
        hours: None,
    }
}
