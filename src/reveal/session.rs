use crate::config::RevealConfig;
use crate::models::RankedResult;
use crate::reveal::timeline::{compute_reveal_schedule, RevealSchedule};
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStage {
    Loading,
    ListReveal,
    PodiumReveal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    ResultsLoaded,
    /// Fired by the auto-advance timer armed for `generation`.
    AutoAdvance { generation: u64 },
    ShowPodium,
    ShowList,
    Teardown,
}

/// Side effects the owner of the state must carry out after a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    pub cancel_timer: bool,
    pub arm_timer: bool,
    pub celebrate: bool,
    pub changed: bool,
}

/// The transition function. Pure; timers are the caller's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealState {
    pub stage: RevealStage,
    pub celebration_active: bool,
    /// Bumped on every podium entry so renderers restart the effect.
    pub celebration_epoch: u64,
    /// Bumped on every loaded result set.
    pub generation: u64,
    pub torn_down: bool,
}

impl Default for RevealState {
    fn default() -> Self {
        Self {
            stage: RevealStage::Loading,
            celebration_active: false,
            celebration_epoch: 0,
            generation: 0,
            torn_down: false,
        }
    }
}

impl RevealState {
    pub fn apply(&mut self, event: RevealEvent) -> Effects {
        if self.torn_down {
            return Effects::default();
        }

        match event {
            RevealEvent::ResultsLoaded => {
                self.stage = RevealStage::ListReveal;
                self.celebration_active = false;
                self.generation += 1;
                Effects { cancel_timer: true, arm_timer: true, celebrate: false, changed: true }
            }
            RevealEvent::AutoAdvance { generation } => {
                if self.stage != RevealStage::ListReveal || generation != self.generation {
                    return Effects::default();
                }
                self.enter_podium();
                Effects { cancel_timer: false, arm_timer: false, celebrate: true, changed: true }
            }
            RevealEvent::ShowPodium => {
                if self.stage != RevealStage::ListReveal {
                    return Effects::default();
                }
                self.enter_podium();
                Effects { cancel_timer: true, arm_timer: false, celebrate: true, changed: true }
            }
            RevealEvent::ShowList => {
                if self.stage != RevealStage::PodiumReveal {
                    return Effects::default();
                }
                self.stage = RevealStage::ListReveal;
                self.celebration_active = false;
                Effects { changed: true, ..Effects::default() }
            }
            RevealEvent::Teardown => {
                self.torn_down = true;
                self.celebration_active = false;
                Effects { cancel_timer: true, changed: true, ..Effects::default() }
            }
        }
    }

    fn enter_podium(&mut self) {
        self.stage = RevealStage::PodiumReveal;
        self.celebration_active = true;
        self.celebration_epoch += 1;
    }
}

/// What the rendering layer sees after each change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSnapshot {
    pub state: RevealState,
    pub entered_at: Instant,
}

struct SessionInner {
    state: RevealState,
    config: RevealConfig,
    results: Vec<RankedResult>,
    schedule: Option<RevealSchedule>,
    timer: Option<JoinHandle<()>>,
    updates: watch::Sender<RevealSnapshot>,
}

/// A running reveal. Clones share the same session.
///
/// Every mutation goes through `dispatch`, and at most one auto-advance
/// timer is outstanding at a time.
#[derive(Clone)]
pub struct RevealSession {
    inner: Arc<Mutex<SessionInner>>,
    updates: watch::Receiver<RevealSnapshot>,
}

impl RevealSession {
    /// A session still waiting for its results.
    pub fn new(config: RevealConfig) -> Self {
        let snapshot = RevealSnapshot { state: RevealState::default(), entered_at: Instant::now() };
        let (tx, rx) = watch::channel(snapshot);
        let inner = SessionInner {
            state: snapshot.state,
            config,
            results: Vec::new(),
            schedule: None,
            timer: None,
            updates: tx,
        };
        Self { inner: Arc::new(Mutex::new(inner)), updates: rx }
    }

    /// Creates the session, loads `results` and arms the auto-advance timer.
    /// Must be called from within a tokio runtime.
    pub fn start(results: Vec<RankedResult>, config: RevealConfig) -> Self {
        let session = Self::new(config);
        session.load(results);
        session
    }

    /// Replaces the result set; any pending timer for the old set is cancelled.
    pub fn load(&self, results: Vec<RankedResult>) {
        {
            let mut inner = lock(&self.inner);
            let schedule = compute_reveal_schedule(&results, &inner.config);
            inner.results = results;
            inner.schedule = Some(schedule);
        }
        dispatch(&self.inner, RevealEvent::ResultsLoaded);
    }

    pub fn request_show_podium(&self) -> bool {
        dispatch(&self.inner, RevealEvent::ShowPodium)
    }

    pub fn request_show_list(&self) -> bool {
        dispatch(&self.inner, RevealEvent::ShowList)
    }

    pub fn teardown(&self) {
        dispatch(&self.inner, RevealEvent::Teardown);
    }

    pub fn current_mode(&self) -> RevealStage {
        lock(&self.inner).state.stage
    }

    pub fn results(&self) -> Vec<RankedResult> {
        lock(&self.inner).results.clone()
    }

    pub fn schedule(&self) -> Option<RevealSchedule> {
        lock(&self.inner).schedule.clone()
    }

    pub fn config(&self) -> RevealConfig {
        lock(&self.inner).config.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RevealSnapshot> {
        self.updates.clone()
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    // State stays consistent even if a holder panicked mid-render
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// The single entry point for every state change
fn dispatch(shared: &Arc<Mutex<SessionInner>>, event: RevealEvent) -> bool {
    let mut inner = lock(shared);
    let before = inner.state.stage;
    let effects = inner.state.apply(event);

    if effects.cancel_timer {
        if let Some(timer) = inner.timer.take() {
            debug!("Cancelling pending auto-advance timer");
            timer.abort();
        }
    }

    if effects.arm_timer {
        let delay = inner
            .schedule
            .as_ref()
            .map(|schedule| schedule.total_reveal_duration)
            .unwrap_or_default();
        let generation = inner.state.generation;
        let weak = Arc::downgrade(shared);
        debug!("Arming auto-advance in {:?} for generation {}", delay, generation);
        inner.timer = Some(tokio::spawn(auto_advance(weak, delay, generation)));
    }

    if effects.changed {
        if effects.celebrate {
            info!("Reveal entering podium (celebration #{})", inner.state.celebration_epoch);
        } else if before != inner.state.stage {
            info!("Reveal stage {:?} -> {:?}", before, inner.state.stage);
        }
        let snapshot = RevealSnapshot { state: inner.state, entered_at: Instant::now() };
        inner.updates.send_replace(snapshot);
    }

    effects.changed
}

async fn auto_advance(session: Weak<Mutex<SessionInner>>, delay: std::time::Duration, generation: u64) {
    tokio::time::sleep(delay).await;
    if let Some(shared) = session.upgrade() {
        {
            // Only forget the handle if it is still ours
            let mut inner = lock(&shared);
            if inner.state.generation == generation {
                inner.timer = None;
            }
        }
        dispatch(&shared, RevealEvent::AutoAdvance { generation });
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
impl RevealSession {
    pub fn state(&self) -> RevealState {
        lock(&self.inner).state
    }

    pub fn has_pending_timer(&self) -> bool {
        lock(&self.inner).timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}
