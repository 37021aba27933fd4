use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::backend::{BackendError, BackendResult, BookingService};
use crate::models::{BookingOutcome, OpeningHours, WizardStep};
use crate::services::wizard::{BookingWizard, WizardEvent, WizardSnapshot};

struct Entry {
    wizard: BookingWizard,
    touched: Instant,
}

impl Entry {
    fn touch(&mut self) -> &mut BookingWizard {
        self.touched = Instant::now();
        &mut self.wizard
    }
}

/// In-memory wizard sessions, one per client flow.
///
/// The lock is only held for synchronous reducer steps. The persistence call
/// runs on its own task, so its result is folded back even when the caller
/// goes away, and `begin_submission` keeps a second submit for the same
/// session from reaching the port while the first is in flight. Sessions idle
/// longer than `idle_ttl` are dropped by `evict_idle`.
pub struct WizardSessions {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    hours: OpeningHours,
    reset_after: Duration,
    idle_ttl: Duration,
}

impl WizardSessions {
    pub fn new(hours: OpeningHours, reset_after: Duration, idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            hours,
            reset_after,
            idle_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create(&self) -> (Uuid, WizardSnapshot) {
        let id = Uuid::new_v4();
        let wizard = BookingWizard::new(self.hours.clone());
        let snapshot = wizard.snapshot();
        self.lock().insert(
            id,
            Entry {
                wizard,
                touched: Instant::now(),
            },
        );
        tracing::debug!(session = %id, "wizard session created");
        (id, snapshot)
    }

    pub fn snapshot(&self, id: Uuid) -> Option<WizardSnapshot> {
        self.lock().get_mut(&id).map(|entry| entry.touch().snapshot())
    }

    pub fn dispatch(&self, id: Uuid, today: NaiveDate, event: WizardEvent) -> Option<WizardSnapshot> {
        let mut sessions = self.lock();
        let wizard = sessions.get_mut(&id)?.touch();
        wizard.dispatch_on(today, event);
        Some(wizard.snapshot())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions untouched for longer than `idle_ttl`. A session with a
    /// submission in flight is kept until its result lands.
    pub fn evict_idle(&self) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.touched.elapsed() < self.idle_ttl || entry.wizard.step() == &WizardStep::Submitting
        });
        before - sessions.len()
    }

    /// Runs `evict_idle` every `every` until the runtime shuts down.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let sessions = Arc::clone(self);
        tokio::spawn(async move {
            let mut sweep = tokio::time::interval(every);
            loop {
                sweep.tick().await;
                let evicted = sessions.evict_idle();
                if evicted > 0 {
                    tracing::info!(evicted, live = sessions.len(), "evicted idle wizard sessions");
                }
            }
        })
    }

    /// Validates and submits the session's draft. On success a reset is
    /// scheduled after `reset_after`; it only fires if the session is still
    /// showing that same success.
    pub async fn submit(
        self: &Arc<Self>,
        id: Uuid,
        today: NaiveDate,
        bookings: Arc<dyn BookingService>,
    ) -> Option<WizardSnapshot> {
        let request = {
            let mut sessions = self.lock();
            let wizard = sessions.get_mut(&id)?.touch();
            match wizard.begin_submission(today) {
                Some(request) => request,
                None => return Some(wizard.snapshot()),
            }
        };

        let sessions = Arc::clone(self);
        let in_flight = tokio::spawn(async move {
            let result = bookings.create_booking(&request).await;
            sessions.finish_submission(id, today, result)
        });

        match in_flight.await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(session = %id, error = %e, "booking submission task failed");
                let failed = BackendError::Internal(anyhow::anyhow!("submission task failed: {e}"));
                self.finish_submission(id, today, Err(failed))
            }
        }
    }

    fn finish_submission(
        self: &Arc<Self>,
        id: Uuid,
        today: NaiveDate,
        result: BackendResult<BookingOutcome>,
    ) -> Option<WizardSnapshot> {
        let snapshot = {
            let mut sessions = self.lock();
            let wizard = sessions.get_mut(&id)?.touch();
            if wizard.step() != &WizardStep::Submitting {
                return Some(wizard.snapshot());
            }
            wizard.complete_submission(today, result);
            wizard.snapshot()
        };

        if let WizardStep::Success { record_id } = snapshot.step {
            self.schedule_reset(id, record_id);
        }
        Some(snapshot)
    }

    fn schedule_reset(self: &Arc<Self>, id: Uuid, record_id: i64) {
        let sessions = Arc::clone(self);
        let delay = self.reset_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut map = sessions.lock();
            if let Some(entry) = map.get_mut(&id) {
                if entry.wizard.step() == &(WizardStep::Success { record_id }) {
                    entry.wizard.dispatch(WizardEvent::Reset);
                    tracing::debug!(session = %id, record_id, "wizard reset after success");
                }
            }
        });
    }
}
