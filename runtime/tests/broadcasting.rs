//! Integration tests for Store action broadcasting
//!
//! Observers see effect-produced actions only after the reducer has applied
//! them, and keyed effects that lose their slot never broadcast.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use catalog_core::{effect::Effect, effect::EffectId, reducer::Reducer, smallvec, SmallVec};
use catalog_runtime::{Store, StoreError};
use std::time::Duration;
use tokio_test::assert_ok;

const FETCH: EffectId = EffectId::new("shelf.fetch");

#[derive(Debug, Clone, PartialEq)]
enum ShelfAction {
    /// Fetch the shelf, replying after `delay_ms`
    Fetch { tag: u32, delay_ms: u64 },
    /// Shelf fetched
    Fetched { tag: u32 },
    /// Restock in two steps
    Restock,
    /// One restock step applied
    Restocked { step: u32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ShelfState {
    last_fetch: Option<u32>,
    steps: Vec<u32>,
}

#[derive(Clone)]
struct ShelfReducer;

impl Reducer for ShelfReducer {
    type State = ShelfState;
    type Action = ShelfAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ShelfAction::Fetch { tag, delay_ms } => smallvec![
                Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Some(ShelfAction::Fetched { tag })
                })
                .switch(FETCH)
            ],
            ShelfAction::Fetched { tag } => {
                state.last_fetch = Some(tag);
                SmallVec::new()
            },
            ShelfAction::Restock => smallvec![Effect::future(async {
                Some(ShelfAction::Restocked { step: 1 })
            })],
            ShelfAction::Restocked { step } => {
                state.steps.push(step);
                if step < 2 {
                    smallvec![Effect::future(async move {
                        Some(ShelfAction::Restocked { step: step + 1 })
                    })]
                } else {
                    SmallVec::new()
                }
            },
        }
    }
}

fn store() -> Store<ShelfState, ShelfAction, (), ShelfReducer> {
    Store::new(ShelfState::default(), ShelfReducer, ())
}

#[tokio::test]
async fn test_broadcast_follows_reduction() -> Result<(), StoreError> {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(ShelfAction::Restock).await?;

    for expected in 1..=2 {
        let action = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("broadcast within timeout")
            .expect("channel open");
        assert_eq!(action, ShelfAction::Restocked { step: expected });
        let applied = store.state(|s| s.steps.len()).await;
        assert!(applied >= expected as usize);
    }
    Ok(())
}

#[tokio::test]
async fn test_sent_actions_are_not_broadcast() -> Result<(), StoreError> {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(ShelfAction::Fetched { tag: 3 }).await?;

    assert!(rx.try_recv().is_err());
    assert_eq!(store.state(|s| s.last_fetch).await, Some(3));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_superseded_result_is_never_broadcast() -> Result<(), StoreError> {
    let store = store();
    let mut rx = store.subscribe_actions();

    store
        .send(ShelfAction::Fetch {
            tag: 1,
            delay_ms: 100,
        })
        .await?;
    let mut latest = store
        .send(ShelfAction::Fetch {
            tag: 2,
            delay_ms: 300,
        })
        .await?;
    latest.wait().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(assert_ok!(rx.try_recv()), ShelfAction::Fetched { tag: 2 });
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_waiters_all_resolve() {
    let store = store();

    let waits: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .send_and_wait_for(
                        ShelfAction::Restock,
                        |a| matches!(a, ShelfAction::Restocked { step: 2 }),
                        Duration::from_secs(1),
                    )
                    .await
            })
        })
        .collect();

    for wait in waits {
        let action = wait.await.unwrap().unwrap();
        assert_eq!(action, ShelfAction::Restocked { step: 2 });
    }
    assert!(store.state(|s| s.steps.len()).await >= 2);
}
