//! List state behavior observed through the watch channel

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use macrohttp_state::{wrap_list_state, AsyncState};

#[derive(Debug, thiserror::Error)]
#[error("page {0} unavailable")]
struct PageError(u32);

fn pages(calls: Arc<AtomicUsize>) -> AsyncState<Vec<u32>, u32> {
    wrap_list_state(
        move |page: u32| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                if page == 0 {
                    return Err(PageError(page));
                }
                Ok((page * 10..page * 10 + 3).collect())
            }
        },
        None,
        None,
    )
}

#[tokio::test(start_paused = true)]
async fn test_list_state_runs_only_on_execute() {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = pages(Arc::clone(&calls));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(state.state().is_empty());

    assert_eq!(state.execute(1).await.unwrap(), vec![10, 11, 12]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_list_state_keeps_stale_data_while_loading() {
    let state = pages(Arc::new(AtomicUsize::new(0)));
    state.execute(1).await.unwrap();

    let mut rx = state.subscribe();
    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            let done = !snapshot.is_loading;
            seen.push((snapshot.state, snapshot.is_loading));
            if done {
                break;
            }
        }
        seen
    });

    state.execute(2).await.unwrap();
    let seen = watcher.await.unwrap();

    assert_eq!(seen.first(), Some(&(vec![10, 11, 12], true)));
    assert_eq!(seen.last(), Some(&(vec![20, 21, 22], false)));
}

#[tokio::test(start_paused = true)]
async fn test_failed_page_keeps_previous_items() {
    let state = pages(Arc::new(AtomicUsize::new(0)));
    state.execute(1).await.unwrap();

    let returned = state.execute(0).await.unwrap();
    assert_eq!(returned, vec![10, 11, 12]);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.state, vec![10, 11, 12]);
    let error = snapshot.error.unwrap();
    assert_eq!(error.downcast_ref::<PageError>().map(|e| e.0), Some(0));
}
