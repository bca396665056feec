use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::{
    RwLock,
    mpsc::{Sender, error::TrySendError},
};
use tracing::{debug, warn};

/// One connected user. The server task owning the socket holds the receiving
/// end of `sender`; dropping the session closes that queue.
#[derive(Debug, Clone)]
pub struct Session {
    id: u64,
    team_id: String,
    user_id: String,
    sender: Sender<Bytes>,
}

impl Session {
    pub fn new(id: u64, team_id: &str, user_id: &str, sender: Sender<Bytes>) -> Self {
        Self {
            id,
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            sender,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Queues a payload without waiting. Returns false when the queue is
    /// full or the socket task is gone.
    pub fn send(&self, payload: Bytes) -> bool {
        match self.sender.try_send(payload) {
            Ok(_) => true,
            Err(TrySendError::Full(_)) => {
                warn!(tid = %self.team_id, uid = %self.user_id, "session queue full, payload dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Sessions of one team, keyed by user id.
#[derive(Debug, Default)]
pub struct SessionGroup {
    sessions: HashMap<String, Session>,
}

impl SessionGroup {
    /// Adds a session, returning the one it replaced for the same user.
    pub fn add(&mut self, session: Session) -> Option<Session> {
        self.sessions.insert(session.user_id.clone(), session)
    }

    /// Removes the user's session only if it is still the one with `id`.
    pub fn remove(&mut self, user_id: &str, id: u64) -> Option<Session> {
        match self.sessions.get(user_id) {
            Some(s) if s.id == id => self.sessions.remove(user_id),
            _ => None,
        }
    }

    pub fn get(&self, user_id: &str) -> Option<&Session> {
        self.sessions.get(user_id)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn push(&self, payload: &Bytes) -> usize {
        self.sessions
            .values()
            .filter(|s| s.send(payload.clone()))
            .count()
    }
}

/// Every team's group, keyed by team id.
#[derive(Debug, Default)]
pub struct SessionMap {
    groups: RwLock<HashMap<String, SessionGroup>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, session: Session) -> Option<Session> {
        let mut groups = self.groups.write().await;
        let tid = session.team_id.clone();
        let replaced = groups.entry(tid).or_default().add(session);
        if let Some(old) = &replaced {
            debug!(tid = %old.team_id, uid = %old.user_id, id = old.id, "session replaced");
        }
        replaced
    }

    /// Removes a session and drops its team once the team is empty.
    pub async fn remove(&self, team_id: &str, user_id: &str, id: u64) -> bool {
        let mut groups = self.groups.write().await;
        let Some(group) = groups.get_mut(team_id) else {
            return false;
        };

        let removed = group.remove(user_id, id).is_some();
        if group.is_empty() {
            groups.remove(team_id);
        }
        removed
    }

    /// Number of teams with at least one session.
    pub async fn count(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn sessions_in(&self, team_id: &str) -> usize {
        self.groups
            .read()
            .await
            .get(team_id)
            .map_or(0, SessionGroup::count)
    }

    pub async fn push(&self, team_id: &str, payload: Bytes) -> usize {
        self.groups
            .read()
            .await
            .get(team_id)
            .map_or(0, |g| g.push(&payload))
    }

    pub async fn push_all(&self, payload: Bytes) -> usize {
        self.groups
            .read()
            .await
            .values()
            .map(|g| g.push(&payload))
            .sum()
    }

    /// Drops every session, which closes their queues.
    pub async fn close(&self) {
        self.groups.write().await.clear();
    }
}
