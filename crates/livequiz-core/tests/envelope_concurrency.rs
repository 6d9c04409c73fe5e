//! Concurrent reads of shared envelopes.
//!
//! Many tasks on a multi-threaded runtime race to read one envelope; the
//! producer must run exactly once and every reader must see the same outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use livequiz_core::{PageSpec, Paged, StorageError, Unpaged};

const READERS: usize = 32;

fn slow_counter(calls: Arc<AtomicUsize>) -> Unpaged<Vec<usize>> {
    Unpaged::new("slow_list", move |page: PageSpec| {
        let calls = Arc::clone(&calls);
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(vec![n; page.size().unwrap_or(1) as usize])
        }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_reads_run_producer_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let envelope = Arc::new(slow_counter(Arc::clone(&calls)));

    let mut handles = Vec::with_capacity(READERS);
    for _ in 0..READERS {
        let envelope = Arc::clone(&envelope);
        handles.push(tokio::spawn(async move {
            envelope.result().await.as_ref().unwrap().clone()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), vec![1]);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(envelope.is_computed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_paged_reads_are_independent_per_envelope() {
    let calls = Arc::new(AtomicUsize::new(0));
    let base = slow_counter(Arc::clone(&calls));
    let first: Arc<Paged<Vec<usize>>> = Arc::new(base.with_size(3).unwrap());
    let second = Arc::new(first.with_page(1).unwrap());

    let mut handles = Vec::new();
    for i in 0..READERS {
        let envelope = if i % 2 == 0 {
            Arc::clone(&first)
        } else {
            Arc::clone(&second)
        };
        handles.push(tokio::spawn(async move {
            envelope.result().await.as_ref().unwrap().len()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 3);
    }

    // One run per paged envelope; the unpaged base was never read.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!base.is_computed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_producer_is_never_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let envelope: Arc<Unpaged<Vec<u8>>> = Arc::new(Unpaged::new("broken_list", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err(StorageError::backend("disk on fire")) }
    }));

    let mut handles = Vec::new();
    for _ in 0..READERS {
        let envelope = Arc::clone(&envelope);
        handles.push(tokio::spawn(async move {
            let failure = envelope.result().await.as_ref().unwrap_err();
            (failure.operation(), failure.cause().to_string())
        }));
    }
    for handle in handles {
        let (operation, cause) = handle.await.unwrap();
        assert_eq!(operation, "broken_list");
        assert!(cause.contains("disk on fire"));
    }

    assert!(envelope.result().await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_read_leaves_envelope_unread() {
    let calls = Arc::new(AtomicUsize::new(0));
    let envelope = slow_counter(Arc::clone(&calls));

    let cancelled = tokio::time::timeout(Duration::from_millis(1), envelope.result()).await;
    assert!(cancelled.is_err());
    assert!(!envelope.is_computed());

    assert_eq!(envelope.result().await.as_ref().unwrap(), &vec![2]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
