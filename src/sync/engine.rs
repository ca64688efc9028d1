//! Draft synchronization engine.
//!
//! Owns the authoritative row collection and keeps it consistent with the
//! store under continuous, unordered, possibly overlapping edits. Edits
//! land synchronously; persistence is debounced per position and raced
//! safely: per-slot generations invalidate stale debounce timers, per-slot
//! tickets invalidate stale save completions, so only the most recently
//! started write for a position can ever apply.
//!
//! All methods must be called from within a tokio runtime; the engine
//! spawns its debounce timers and completion handlers there. The internal
//! lock is never held across an await.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::normalize::normalize_row;
use crate::core::validate::{classify_row, sheet_status};
use crate::errors::AppResult;
use crate::models::draft_row::DraftRow;
use crate::models::row_state::{RowState, SaveStatus, SheetStatus};
use crate::sync::gateway::DraftStore;
use crate::sync::status::StatusProjector;

/// Timing knobs for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet period after the last edit before a row is persisted.
    pub debounce: Duration,
    /// Minimum time the "syncing" indicator stays visible.
    pub min_syncing: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(750),
            min_syncing: Duration::from_millis(400),
        }
    }
}

/// Change notifications pushed to the UI layer.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The authoritative collection changed; replace the grid wholesale.
    RowsChanged(Vec<DraftRow>),
    /// A persistence call failed; the row stays dirty. Non-blocking.
    PersistFailed {
        position: Option<usize>,
        message: String,
    },
}

/// Per-position bookkeeping. The tagged save state of a slot is readable
/// from its fields: pending+timer = debouncing, ticket = in flight,
/// neither = idle.
#[derive(Debug, Default)]
struct Slot {
    /// Bumped on every edit and every structural shift; a debounce timer
    /// carries the generation it was scheduled under and fires only if it
    /// still matches.
    generation: u64,
    /// Latest unpersisted snapshot, consumed when the timer fires.
    pending: Option<DraftRow>,
    timer: Option<JoinHandle<()>>,
    /// Ticket of the live in-flight save. A completion whose ticket no
    /// longer matches is discarded.
    ticket: Option<u64>,
    /// Displayed content not confirmed durable yet.
    unsynced: bool,
}

struct EngineState {
    rows: Vec<DraftRow>,
    slots: Vec<Slot>,
    next_ticket: u64,
    inflight_count: usize,
}

pub struct DraftSyncEngine {
    store: Arc<dyn DraftStore>,
    config: EngineConfig,
    state: Mutex<EngineState>,
    events: broadcast::Sender<EngineEvent>,
    status: Arc<StatusProjector>,
}

impl DraftSyncEngine {
    pub fn new(store: Arc<dyn DraftStore>, config: EngineConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let status = StatusProjector::new(config.min_syncing);
        Arc::new(Self {
            store,
            config,
            state: Mutex::new(EngineState {
                rows: vec![DraftRow::blank()],
                slots: vec![Slot::default()],
                next_ticket: 0,
                inflight_count: 0,
            }),
            events,
            status,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.status.current()
    }

    /// Snapshot of the authoritative collection.
    pub fn rows(&self) -> Vec<DraftRow> {
        self.state.lock().unwrap().rows.clone()
    }

    /// Advisory aggregate validation of the current collection.
    pub fn sheet_status(&self) -> SheetStatus {
        sheet_status(&self.state.lock().unwrap().rows)
    }

    /// Replace the collection from the store. Clears all bookkeeping.
    pub async fn load(self: &Arc<Self>) -> AppResult<()> {
        let mut rows = self.store.load_all().await?;
        if rows.last().is_none_or(|r| !r.is_blank()) {
            rows.push(DraftRow::blank());
        }

        let snapshot = {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            for slot in &mut st.slots {
                if let Some(t) = slot.timer.take() {
                    t.abort();
                }
            }
            st.slots = (0..rows.len()).map(|_| Slot::default()).collect();
            st.inflight_count = 0;
            st.rows = rows;
            st.rows.clone()
        };

        info!(rows = snapshot.len(), "draft collection loaded");
        self.emit(EngineEvent::RowsChanged(snapshot));
        self.refresh_status();
        Ok(())
    }

    /// Apply an edit to a position: normalize, stage for persistence, and
    /// (re)start the debounce timer. Runs the dependency cascade before
    /// anything is scheduled, so a debounced save can never carry a stale
    /// dependent value.
    pub fn edit(self: &Arc<Self>, position: usize, row: DraftRow) {
        let normalized = normalize_row(&row);

        let snapshot;
        let schedule;
        {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            if position >= st.rows.len() {
                warn!(position, "edit past the end of the grid ignored");
                return;
            }
            st.rows[position] = normalized.clone();

            let slot = &mut st.slots[position];
            slot.generation += 1;
            if let Some(t) = slot.timer.take() {
                t.abort();
            }

            // A pristine blank row has nothing to persist; everything else
            // is staged and marked unsynced.
            if normalized.is_blank() && normalized.id.is_none() {
                slot.pending = None;
                slot.unsynced = false;
                schedule = None;
            } else {
                slot.pending = Some(normalized);
                slot.unsynced = true;
                schedule = Some(slot.generation);
            }

            if st.rows.last().is_none_or(|r| !r.is_blank()) {
                st.rows.push(DraftRow::blank());
                st.slots.push(Slot::default());
            }
            snapshot = st.rows.clone();
        }

        self.emit(EngineEvent::RowsChanged(snapshot));
        if let Some(generation) = schedule {
            self.schedule_debounce(position, generation);
        }
        self.refresh_status();
    }

    fn schedule_debounce(self: &Arc<Self>, position: usize, generation: u64) {
        let engine = Arc::clone(self);
        let delay = self.config.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.debounce_fired(position, generation).await;
        });

        let mut guard = self.state.lock().unwrap();
        match guard.slots.get_mut(position) {
            Some(slot) if slot.generation == generation => slot.timer = Some(handle),
            // a newer edit or a structural change got in first
            _ => handle.abort(),
        }
    }

    async fn debounce_fired(self: &Arc<Self>, position: usize, generation: u64) {
        {
            let mut guard = self.state.lock().unwrap();
            match guard.slots.get_mut(position) {
                Some(slot) if slot.generation == generation => slot.timer = None,
                _ => {
                    debug!(position, generation, "debounce timer superseded");
                    return;
                }
            }
        }
        self.commit(position).await;
    }

    /// Persist position `position` now. Supersedes any in-flight save for
    /// the same position; only this call's outcome may apply afterwards.
    pub async fn commit(self: &Arc<Self>, position: usize) {
        let prepared = {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            if position >= st.rows.len() {
                None
            } else {
                let slot = &mut st.slots[position];
                if let Some(t) = slot.timer.take() {
                    t.abort(); // manual sync bypasses the debounce
                }
                let row = slot
                    .pending
                    .take()
                    .unwrap_or_else(|| st.rows[position].clone());

                match classify_row(&row) {
                    RowState::Complete => {
                        st.next_ticket += 1;
                        let ticket = st.next_ticket;
                        let slot = &mut st.slots[position];
                        if slot.ticket.replace(ticket).is_some() {
                            debug!(position, "superseding in-flight save");
                        } else {
                            st.inflight_count += 1;
                        }
                        Some((row, ticket))
                    }
                    RowState::Empty if row.id.is_none() => {
                        st.slots[position].unsynced = false;
                        None
                    }
                    state => {
                        // validation failures never reach the store; the row
                        // stays dirty until it is completed or deleted
                        debug!(position, ?state, "row not persistable yet; left dirty");
                        None
                    }
                }
            }
        };
        self.refresh_status();

        let Some((row, ticket)) = prepared else {
            return;
        };

        let result = self.store.upsert(&row).await;

        let mut changed_rows = None;
        let mut failure = None;
        {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            let live = st
                .slots
                .get(position)
                .is_some_and(|s| s.ticket == Some(ticket));
            if !live {
                // superseded or removed while we were writing; a newer
                // operation owns this position now
                debug!(position, ticket, "stale save result discarded");
            } else {
                st.slots[position].ticket = None;
                st.inflight_count -= 1;

                match &result {
                    Ok(canonical) => {
                        let same = st.rows[position].same_content(canonical);
                        if same {
                            st.slots[position].unsynced = false;
                        } else {
                            // a newer edit is already pending or in flight
                            debug!(position, "canonical row outdated by newer edit; still dirty");
                        }
                        if st.rows[position].merge_canonical(canonical) {
                            changed_rows = Some(st.rows.clone());
                        }
                    }
                    Err(e) => {
                        warn!(position, error = %e, "persist failed; row stays dirty");
                        failure = Some(e.to_string());
                    }
                }
            }
        }

        if let Some(rows) = changed_rows {
            self.emit(EngineEvent::RowsChanged(rows));
        }
        if let Some(message) = failure {
            self.emit(EngineEvent::PersistFailed {
                position: Some(position),
                message,
            });
        }
        self.refresh_status();
    }

    /// Flush every unsynced position immediately, bypassing debounce.
    /// Awaited; used before navigation and shutdown.
    pub async fn sync_now(self: &Arc<Self>) {
        let positions: Vec<usize> = {
            let guard = self.state.lock().unwrap();
            guard
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.unsynced)
                .map(|(i, _)| i)
                .collect()
        };
        for position in positions {
            self.commit(position).await;
        }
    }

    /// Remove a range of rows. Snapshots are taken before removal; every
    /// snapshot with identity is deleted from the store afterwards. The
    /// collection is rebuilt from the engine's own authoritative state,
    /// never reloaded, so concurrent edits elsewhere are not clobbered.
    pub async fn delete_rows(self: &Arc<Self>, range: Range<usize>) {
        let (snapshots, snapshot_rows, reschedule) = {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            let start = range.start.min(st.rows.len());
            let end = range.end.min(st.rows.len());
            if start >= end {
                return;
            }

            let removed_rows: Vec<DraftRow> = st.rows.drain(start..end).collect();
            let removed_slots: Vec<Slot> = st.slots.drain(start..end).collect();
            for mut slot in removed_slots {
                if let Some(t) = slot.timer.take() {
                    t.abort();
                }
                if slot.ticket.take().is_some() {
                    st.inflight_count -= 1;
                }
            }

            // Slots after the removal point shifted down: their timers and
            // in-flight tickets still name the old indices, so none of
            // their outcomes may apply. Bump generations, drop tickets and
            // reschedule what still has pending work.
            let mut reschedule = Vec::new();
            for (i, slot) in st.slots.iter_mut().enumerate().skip(start) {
                slot.generation += 1;
                if let Some(t) = slot.timer.take() {
                    t.abort();
                }
                if slot.ticket.take().is_some() {
                    st.inflight_count -= 1;
                    slot.unsynced = true;
                }
                if slot.pending.is_some() {
                    reschedule.push((i, slot.generation));
                }
            }

            if st.rows.last().is_none_or(|r| !r.is_blank()) {
                st.rows.push(DraftRow::blank());
                st.slots.push(Slot::default());
            }

            (removed_rows, st.rows.clone(), reschedule)
        };

        self.emit(EngineEvent::RowsChanged(snapshot_rows));
        for (position, generation) in reschedule {
            self.schedule_debounce(position, generation);
        }
        self.refresh_status();

        for snap in snapshots {
            if let Some(id) = snap.id {
                match self.store.delete(id).await {
                    Ok(n) => debug!(id, rows = n, "removed row deleted from store"),
                    Err(e) => {
                        warn!(id, error = %e, "failed to delete removed row from store");
                        self.emit(EngineEvent::PersistFailed {
                            position: None,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Batch reconciliation: persist every complete row, then delete
    /// persisted rows no position references any more. Afterwards the
    /// store's identities match the collection's.
    pub async fn reconcile(self: &Arc<Self>) -> AppResult<()> {
        let complete: Vec<usize> = {
            let guard = self.state.lock().unwrap();
            guard
                .rows
                .iter()
                .enumerate()
                .filter(|(_, r)| classify_row(r).is_complete())
                .map(|(i, _)| i)
                .collect()
        };
        for position in complete {
            self.commit(position).await;
        }

        let persisted = self.store.load_all().await?;
        let live: HashSet<i64> = {
            let guard = self.state.lock().unwrap();
            guard.rows.iter().filter_map(|r| r.id).collect()
        };

        for row in persisted {
            if let Some(id) = row.id
                && !live.contains(&id)
            {
                info!(id, "removing orphaned draft row");
                if let Err(e) = self.store.delete(id).await {
                    warn!(id, error = %e, "failed to delete orphan");
                }
            }
        }

        Ok(())
    }

    fn refresh_status(&self) {
        let (in_flight, dirty) = {
            let guard = self.state.lock().unwrap();
            (
                guard.inflight_count > 0,
                guard.slots.iter().any(|s| s.unsynced),
            )
        };
        self.status.update(in_flight, dirty);
    }

    fn emit(&self, event: EngineEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }
}
