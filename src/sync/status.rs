//! Save-status projection: clean / syncing / dirty.
//!
//! A separate aggregate state machine fed by the engine's two inputs
//! (anything in flight? anything unsynced?). Once "syncing" is shown it
//! stays up for a minimum duration so sub-100ms saves don't flicker the
//! indicator. The projection says nothing about durability.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::models::row_state::SaveStatus;

struct ProjectorState {
    current: SaveStatus,
    syncing_since: Option<Instant>,
    hold_pending: bool,
    in_flight: bool,
    dirty: bool,
}

pub struct StatusProjector {
    min_hold: Duration,
    tx: watch::Sender<SaveStatus>,
    state: Mutex<ProjectorState>,
}

impl StatusProjector {
    pub fn new(min_hold: Duration) -> Arc<Self> {
        let (tx, _rx) = watch::channel(SaveStatus::Clean);
        Arc::new(Self {
            min_hold,
            tx,
            state: Mutex::new(ProjectorState {
                current: SaveStatus::Clean,
                syncing_since: None,
                hold_pending: false,
                in_flight: false,
                dirty: false,
            }),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SaveStatus {
        self.state.lock().unwrap().current
    }

    /// Feed the projector the engine's aggregate inputs.
    pub fn update(self: &Arc<Self>, in_flight: bool, dirty: bool) {
        let mut st = self.state.lock().unwrap();
        st.in_flight = in_flight;
        st.dirty = dirty;
        self.apply(&mut st);
    }

    fn apply(self: &Arc<Self>, st: &mut ProjectorState) {
        let target = if st.in_flight {
            SaveStatus::Syncing
        } else if st.dirty {
            SaveStatus::Dirty
        } else {
            SaveStatus::Clean
        };

        if target == SaveStatus::Syncing {
            if st.current != SaveStatus::Syncing {
                st.current = SaveStatus::Syncing;
                st.syncing_since = Some(Instant::now());
                self.tx.send_replace(SaveStatus::Syncing);
            }
            return;
        }

        // Leaving "syncing": honor the minimum display duration first.
        if st.current == SaveStatus::Syncing
            && let Some(since) = st.syncing_since
        {
            let elapsed = since.elapsed();
            if elapsed < self.min_hold {
                if !st.hold_pending {
                    st.hold_pending = true;
                    let this = Arc::clone(self);
                    let wait = self.min_hold - elapsed;
                    tokio::spawn(async move {
                        tokio::time::sleep(wait).await;
                        this.recheck();
                    });
                }
                debug!("save finished inside the hold window; recheck deferred");
                return;
            }
        }

        if st.current != target {
            st.current = target;
            st.syncing_since = None;
            self.tx.send_replace(target);
        }
    }

    fn recheck(self: &Arc<Self>) {
        let mut st = self.state.lock().unwrap();
        st.hold_pending = false;
        self.apply(&mut st);
    }
}
