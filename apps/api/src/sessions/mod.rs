//! Session management: one puzzle per session id, one mutation at a time.
//!
//! The session map is the only state shared across sessions and sits behind
//! a `std::sync::RwLock`. Each session's puzzle has its own
//! `tokio::sync::Mutex`; every operation (reads included) holds it for its
//! whole duration, so requests against the same id form a single timeline
//! while different sessions run in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::puzzle::Puzzle;

pub mod handlers;
pub mod sweeper;

/// Opaque, unguessable session identifier (random v4 UUID).
pub type SessionId = String;

/// A live session: its puzzle plus the last time anyone asked for it.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    puzzle: Arc<Mutex<Puzzle>>,
    /// Unix milliseconds of the last lookup.
    last_access: AtomicI64,
}

impl Session {
    fn new(id: SessionId, puzzle: Puzzle, now: DateTime<Utc>) -> Self {
        Self {
            id,
            puzzle: Arc::new(Mutex::new(puzzle)),
            last_access: AtomicI64::new(now.timestamp_millis()),
        }
    }

    fn touch(&self, now: DateTime<Utc>) {
        self.last_access
            .fetch_max(now.timestamp_millis(), Ordering::Relaxed);
    }

    fn idle_since(&self, now: DateTime<Utc>) -> Duration {
        Duration::milliseconds(now.timestamp_millis() - self.last_access.load(Ordering::Relaxed))
    }
}

/// Owns every live session.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Session>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session around `puzzle` and returns its fresh id.
    pub fn create(&self, puzzle: Puzzle) -> SessionId {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone(), puzzle, Utc::now()));

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), session);

        info!(session_id = %id, "Created session");
        id
    }

    /// Looks a session up and marks it as used.
    pub fn get(&self, id: &str) -> Result<Arc<Session>, AppError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.get(id).cloned().ok_or_else(|| {
            debug!(session_id = id, "Session not found");
            AppError::SessionNotFound(id.to_string())
        })?;
        // touched under the map lock so a concurrent sweep sees the new time
        session.touch(Utc::now());
        Ok(session)
    }

    /// Runs `f` with exclusive access to the session's puzzle.
    ///
    /// Waits for any operation already in flight on the same session. `f` runs
    /// on the blocking pool with the lock held for its entire duration.
    pub async fn with_session<F, T>(&self, id: &str, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Puzzle) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let session = self.get(id)?;
        let mut puzzle = session.puzzle.clone().lock_owned().await;
        // a sweep may have evicted the session while we waited for the lock
        if !self.is_live(&session) {
            debug!(session_id = id, "Session evicted before its operation started");
            return Err(AppError::SessionNotFound(id.to_string()));
        }

        tokio::task::spawn_blocking(move || f(&mut *puzzle))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow!("Session task for {} failed: {e}", session.id))
            })?
    }

    /// True while `session` is still the one registered under its id.
    fn is_live(&self, session: &Arc<Session>) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session.id)
            .is_some_and(|current| Arc::ptr_eq(current, session))
    }

    /// Removes sessions idle for longer than `max_idle`.
    /// Sessions with an operation in flight are kept. Returns how many were removed.
    pub fn sweep_expired(&self, max_idle: Duration) -> usize {
        self.sweep_expired_at(Utc::now(), max_idle)
    }

    fn sweep_expired_at(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();

        sessions.retain(|id, session| {
            if session.idle_since(now) <= max_idle {
                return true;
            }
            if session.puzzle.try_lock().is_err() {
                debug!(session_id = %id, "Skipping busy session during sweep");
                return true;
            }
            debug!(session_id = %id, "Evicting idle session");
            false
        });

        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{Lexicon, WordIndex};
    use crate::puzzle::Bounds;

    fn puzzle() -> Puzzle {
        Puzzle::seeded("кроссворд", 2..=10).unwrap()
    }

    #[test]
    fn test_create_then_get() {
        let manager = SessionManager::new();
        let id = manager.create(puzzle());

        assert_eq!(id.len(), 36);
        assert_eq!(manager.get(&id).unwrap().id, id);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let manager = SessionManager::new();
        let a = manager.create(puzzle());
        let b = manager.create(puzzle());
        assert_ne!(a, b);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let manager = SessionManager::new();
        assert!(matches!(
            manager.get("no-such-session"),
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_with_session_mutates_in_place() {
        let manager = SessionManager::new();
        let id = manager.create(puzzle());
        let lexicon: Arc<dyn Lexicon> = Arc::new(WordIndex::builtin());

        let shared = lexicon.clone();
        let added = manager
            .with_session(&id, move |p| p.fill_to_count(shared.as_ref(), 6))
            .await
            .unwrap();
        assert_eq!(added, 5);

        let count = manager
            .with_session(&id, |p| Ok(p.word_count()))
            .await
            .unwrap();
        assert_eq!(count, 6);
    }

    #[tokio::test]
    async fn test_with_session_propagates_errors() {
        let manager = SessionManager::new();
        let id = manager.create(puzzle());

        let result: Result<(), AppError> = manager
            .with_session(&id, |_| Err(AppError::InvalidInput("nope".into())))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let missing = manager.with_session("missing", |p| Ok(p.word_count())).await;
        assert!(matches!(missing, Err(AppError::SessionNotFound(_))));
    }

    #[test]
    fn test_sweep_removes_only_idle_sessions() {
        let manager = SessionManager::new();
        let stale = manager.create(puzzle());
        let fresh = manager.create(puzzle());

        let later = Utc::now() + Duration::minutes(90);
        manager.get(&fresh).unwrap().touch(later);

        let removed = manager.sweep_expired_at(later, Duration::hours(1));

        assert_eq!(removed, 1);
        assert!(matches!(manager.get(&stale), Err(AppError::SessionNotFound(_))));
        assert!(manager.get(&fresh).is_ok());
    }

    #[tokio::test]
    async fn test_sweep_skips_session_with_operation_in_flight() {
        let manager = SessionManager::new();
        let id = manager.create(puzzle());
        let session = manager.get(&id).unwrap();

        let guard = session.puzzle.lock().await;
        let later = Utc::now() + Duration::hours(2);
        assert_eq!(manager.sweep_expired_at(later, Duration::hours(1)), 0);
        drop(guard);

        assert_eq!(manager.sweep_expired_at(later, Duration::hours(1)), 1);
        assert_eq!(manager.len(), 0);
    }

    #[tokio::test]
    async fn test_operation_on_session_evicted_while_waiting_fails() {
        let manager = SessionManager::new();
        let id = manager.create(puzzle());
        let session = manager.get(&id).unwrap();

        let guard = session.puzzle.lock().await;
        let waiting = {
            let manager = manager.clone();
            let id = id.clone();
            tokio::spawn(async move {
                manager
                    .with_session(&id, |p| Ok(p.word_count()))
                    .await
            })
        };
        // let the operation look the session up and queue on the lock
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        manager
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        drop(guard);

        let result = waiting.await.unwrap();
        assert!(matches!(result, Err(AppError::SessionNotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_expands_keep_grid_consistent() {
        let manager = SessionManager::new();
        let id = manager.create(puzzle());
        let lexicon: Arc<dyn Lexicon> = Arc::new(WordIndex::builtin());

        let mut tasks = Vec::new();
        for i in 0..16 {
            let manager = manager.clone();
            let lexicon = lexicon.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                let x0 = (i % 4) * 12 - 24;
                let y0 = (i / 4) * 12 - 24;
                let bounds = Bounds {
                    x0,
                    y0,
                    x1: x0 + 12,
                    y1: y0 + 12,
                };
                manager
                    .with_session(&id, move |p| {
                        let added = p.expand(lexicon.as_ref(), bounds)?.len();
                        Ok((added, p.word_count()))
                    })
                    .await
            }));
        }

        let mut added_total = 0;
        for task in tasks {
            let (added, _) = task.await.unwrap().unwrap();
            added_total += added;
        }

        let (total, violations) = manager
            .with_session(&id, |p| Ok((p.word_count(), p.grid().audit())))
            .await
            .unwrap();
        assert!(violations.is_empty(), "{violations:?}");
        assert_eq!(total, 1 + added_total);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = SessionManager::new();
        let a = manager.create(puzzle());
        let b = manager.create(Puzzle::seeded("программа", 2..=10).unwrap());
        let lexicon: Arc<dyn Lexicon> = Arc::new(WordIndex::builtin());

        manager
            .with_session(&a, move |p| p.fill_to_count(lexicon.as_ref(), 12))
            .await
            .unwrap();

        let (count, seed) = manager
            .with_session(&b, |p| Ok((p.word_count(), p.words()[0].word.clone())))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(seed, "программа");
    }
}
