use crate::reveal::session::RevealSession;
use log::info;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

struct ActiveReveal {
    session: RevealSession,
    channel_id: u64,
    presenter_id: u64,
    last_touched: Instant,
}

#[derive(Default)]
struct Sessions {
    by_id: HashMap<Uuid, ActiveReveal>,
    by_channel: HashMap<u64, Uuid>,
}

/// Live reveal sessions, at most one per channel.
#[derive(Default)]
pub struct RevealRegistry {
    sessions: Mutex<Sessions>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    Missing,
    NotPresenter,
}

impl RevealRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session for a channel, tearing down whatever ran there before.
    pub fn insert(&self, channel_id: u64, presenter_id: u64, session: RevealSession) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut sessions = self.lock();

        if let Some(previous_id) = sessions.by_channel.insert(channel_id, session_id) {
            if let Some(previous) = sessions.by_id.remove(&previous_id) {
                info!("Replacing reveal {} in channel {}", previous_id, channel_id);
                previous.session.teardown();
            }
        }

        sessions.by_id.insert(
            session_id,
            ActiveReveal { session, channel_id, presenter_id, last_touched: Instant::now() },
        );
        session_id
    }

    /// The session behind a button press, if `user_id` may control it.
    pub fn control(&self, session_id: &Uuid, user_id: u64) -> Result<RevealSession, Lookup> {
        let mut sessions = self.lock();
        let active = sessions.by_id.get_mut(session_id).ok_or(Lookup::Missing)?;
        if active.presenter_id != user_id {
            return Err(Lookup::NotPresenter);
        }
        active.last_touched = Instant::now();
        Ok(active.session.clone())
    }

    pub fn remove(&self, session_id: &Uuid) -> bool {
        let mut sessions = self.lock();
        match sessions.by_id.remove(session_id) {
            Some(active) => {
                if sessions.by_channel.get(&active.channel_id) == Some(session_id) {
                    sessions.by_channel.remove(&active.channel_id);
                }
                active.session.teardown();
                true
            }
            None => false,
        }
    }

    /// Tears down sessions nobody has touched for `max_idle`.
    pub fn reap_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.lock();
        let expired: Vec<Uuid> = sessions
            .by_id
            .iter()
            .filter(|(_, active)| now.duration_since(active.last_touched) >= max_idle)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(active) = sessions.by_id.remove(id) {
                sessions.by_channel.remove(&active.channel_id);
                active.session.teardown();
            }
        }
        expired.len()
    }

    pub fn teardown_all(&self) {
        let mut sessions = self.lock();
        for (_, active) in sessions.by_id.drain() {
            active.session.teardown();
        }
        sessions.by_channel.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RevealConfig;
    use crate::models::RankedResult;
    use crate::reveal::session::RevealStage;

    fn session() -> RevealSession {
        let results = vec![RankedResult {
            id: 1,
            team_name: "Team Phi".to_string(),
            project_name: "Freelance Job Matching".to_string(),
            description: None,
            votes: 88,
            rank: 1,
        }];
        RevealSession::start(results, RevealConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn new_reveal_replaces_the_channels_old_one() {
        let registry = RevealRegistry::new();
        let old = session();
        let old_id = registry.insert(10, 1, old.clone());
        let new_id = registry.insert(10, 1, session());

        assert_eq!(registry.len(), 1);
        assert!(old.state().torn_down);
        assert!(!old.has_pending_timer());
        assert_eq!(registry.control(&old_id, 1).err(), Some(Lookup::Missing));
        assert!(registry.control(&new_id, 1).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_presenter_controls_a_reveal() {
        let registry = RevealRegistry::new();
        let id = registry.insert(10, 1, session());
        assert_eq!(registry.control(&id, 2).err(), Some(Lookup::NotPresenter));
        let controlled = registry.control(&id, 1).unwrap();
        assert!(controlled.request_show_podium());
        assert_eq!(controlled.current_mode(), RevealStage::PodiumReveal);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_reaped() {
        let registry = RevealRegistry::new();
        let idle = session();
        let idle_id = registry.insert(10, 1, idle.clone());
        tokio::time::advance(Duration::from_secs(50)).await;
        let busy_id = registry.insert(11, 1, session());

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(registry.reap_idle(Duration::from_secs(60)), 1);
        assert!(idle.state().torn_down);
        assert_eq!(registry.control(&idle_id, 1).err(), Some(Lookup::Missing));
        assert!(registry.control(&busy_id, 1).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn removal_and_teardown_all() {
        let registry = RevealRegistry::new();
        let first = registry.insert(10, 1, session());
        registry.insert(11, 1, session());
        assert!(registry.remove(&first));
        assert!(!registry.remove(&first));
        registry.teardown_all();
        assert_eq!(registry.len(), 0);
    }
}
