//! Integration tests for the session store
//!
//! Covers exclusive access, capacity limits and eviction of finished and idle
//! sessions.

mod common;

use common::{scripted, ScriptedJudge};
use gauge_engine::config::{InterviewConfig, SessionsConfig};
use gauge_engine::session::{InterviewSession, SessionId, SessionStore};
use sdk::errors::EngineError;
use sdk::types::{PositionLevel, SessionState};
use std::time::Duration;

fn new_session() -> InterviewSession {
    InterviewSession::for_level(
        "Grace",
        PositionLevel::Beginner,
        &InterviewConfig::default(),
        scripted(ScriptedJudge::constant(0.6)),
    )
}

#[tokio::test]
async fn test_acquire_is_exclusive() {
    let store = SessionStore::new(4, Duration::from_secs(60));
    let id = store.insert(new_session()).unwrap();

    let guard = store.acquire(id).unwrap();
    assert!(matches!(
        store.acquire(id).unwrap_err(),
        EngineError::SessionBusy(_)
    ));
    drop(guard);

    let guard = store.acquire(id).unwrap();
    assert_eq!(guard.id(), id);
}

#[tokio::test]
async fn test_unknown_session() {
    let store = SessionStore::new(4, Duration::from_secs(60));
    assert!(matches!(
        store.acquire(SessionId::new()).unwrap_err(),
        EngineError::SessionNotFound(_)
    ));
    assert!(!store.remove(SessionId::new()));
}

#[tokio::test]
async fn test_store_full_with_live_sessions() {
    let store = SessionStore::new(2, Duration::from_secs(60));
    store.insert(new_session()).unwrap();
    store.insert(new_session()).unwrap();

    let err = store.insert(new_session()).unwrap_err();
    assert!(matches!(err, EngineError::StoreFull { capacity: 2 }));
    assert_eq!(store.len(), 2);
    assert_eq!(store.capacity(), 2);
}

#[tokio::test]
async fn test_finished_session_makes_room() {
    let store = SessionStore::from_config(&SessionsConfig {
        max_sessions: 1,
        idle_ttl_secs: 3600,
    });
    let finished = store.insert(new_session()).unwrap();

    {
        let mut session = store.acquire(finished).unwrap();
        session.start().await.unwrap();
        while !session.submit_answer("answer").await.unwrap().is_complete {}
        assert_eq!(session.state(), SessionState::Completed);
    }

    let fresh = store.insert(new_session()).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.acquire(fresh).is_ok());
    assert!(matches!(
        store.acquire(finished).unwrap_err(),
        EngineError::SessionNotFound(_)
    ));
}

#[tokio::test]
async fn test_held_finished_session_is_not_evicted() {
    let store = SessionStore::new(1, Duration::from_secs(3600));
    let id = store.insert(new_session()).unwrap();

    let mut session = store.acquire(id).unwrap();
    session.start().await.unwrap();
    while !session.submit_answer("answer").await.unwrap().is_complete {}

    assert!(matches!(
        store.insert(new_session()).unwrap_err(),
        EngineError::StoreFull { .. }
    ));
}

#[tokio::test]
async fn test_idle_sessions_expire() {
    let store = SessionStore::new(4, Duration::from_millis(30));
    let idle = store.insert(new_session()).unwrap();
    let busy = store.insert(new_session()).unwrap();
    let _guard = store.acquire(busy).unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(store.evict_expired(), 1);
    assert_eq!(store.len(), 1);
    assert!(matches!(
        store.acquire(idle).unwrap_err(),
        EngineError::SessionNotFound(_)
    ));
}

#[tokio::test]
async fn test_remove() {
    let store = SessionStore::new(4, Duration::from_secs(60));
    let id = store.insert(new_session()).unwrap();

    assert!(store.remove(id));
    assert!(store.is_empty());
}
