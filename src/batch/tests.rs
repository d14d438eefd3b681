use super::*;
use crate::{Error, ErrorCode, ErrorContext, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

impl BatchRequest for String {
    fn dedup_key(&self) -> String {
        self.clone()
    }
}

#[derive(Clone, Default)]
struct Recorder {
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Recorder {
    fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

fn echo_batcher(
    config: BatchConfig,
    latency: Duration,
) -> (
    RequestBatcher<impl BatchExecutor<Request = String, Output = String>>,
    Recorder,
) {
    let recorder = Recorder::default();
    let r = recorder.clone();
    let executor = executor_fn(move |requests: Vec<String>| {
        let r = r.clone();
        async move {
            r.batches.lock().unwrap().push(requests.clone());
            let now = r.active.fetch_add(1, Ordering::SeqCst) + 1;
            r.peak.fetch_max(now, Ordering::SeqCst);
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            r.active.fetch_sub(1, Ordering::SeqCst);
            let out: Vec<Result<String>> = requests
                .into_iter()
                .map(|name| Ok(format!("<svg>{}</svg>", name)))
                .collect();
            Ok::<_, Error>(out)
        }
    });
    (RequestBatcher::new(executor, config), recorder)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

async fn wait_for_pending<E: BatchExecutor>(batcher: &RequestBatcher<E>, n: usize) {
    while batcher.pending_count() != n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_identical_requests_share_one_dispatch_slot() {
    let (batcher, recorder) = echo_batcher(BatchConfig::default(), Duration::ZERO);
    let (a, b, c) = tokio::join!(
        batcher.enqueue("home".to_string()),
        batcher.enqueue("home".to_string()),
        batcher.enqueue("star".to_string()),
    );
    assert_eq!(a.unwrap(), "<svg>home</svg>");
    assert_eq!(b.unwrap(), "<svg>home</svg>");
    assert_eq!(c.unwrap(), "<svg>star</svg>");
    assert_eq!(recorder.batches(), vec![names(&["home", "star"])]);
}

#[tokio::test(start_paused = true)]
async fn test_dedup_disabled_sends_duplicates() {
    let (batcher, recorder) =
        echo_batcher(BatchConfig::default().with_dedup(false), Duration::ZERO);
    let results = batcher
        .enqueue_many(names(&["home", "home"]))
        .await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(recorder.batches(), vec![names(&["home", "home"])]);
}

#[tokio::test(start_paused = true)]
async fn test_results_follow_request_order() {
    let (batcher, recorder) = echo_batcher(BatchConfig::default(), Duration::ZERO);
    let results = batcher
        .enqueue_many(names(&["c", "a", "b"]))
        .await;
    let values: Vec<String> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, vec!["<svg>c</svg>", "<svg>a</svg>", "<svg>b</svg>"]);
    assert_eq!(recorder.batches(), vec![names(&["c", "a", "b"])]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_trigger_dispatches_after_max_wait() {
    let config = BatchConfig::default().with_max_wait_time(Duration::from_millis(10));
    let (batcher, recorder) = echo_batcher(config, Duration::ZERO);
    let started = Instant::now();
    let results = batcher.enqueue_many(names(&["a", "b"])).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert!(started.elapsed() >= Duration::from_millis(10));
    assert_eq!(recorder.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_size_trigger_splits_and_leftover_waits_for_timer() {
    let config = BatchConfig::default()
        .with_max_batch_size(3)
        .with_max_wait_time(Duration::from_secs(3600));
    let (batcher, recorder) = echo_batcher(config, Duration::ZERO);
    let started = Instant::now();
    let results = batcher
        .enqueue_many(names(&["a", "b", "c", "d", "e", "f", "g"]))
        .await;
    assert_eq!(results.len(), 7);
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(
        recorder.batches(),
        vec![
            names(&["a", "b", "c"]),
            names(&["d", "e", "f"]),
            names(&["g"]),
        ]
    );
    assert!(started.elapsed() >= Duration::from_secs(3600));
}

#[tokio::test(start_paused = true)]
async fn test_only_one_dispatch_in_flight() {
    let config = BatchConfig::default().with_max_batch_size(2);
    let (batcher, recorder) = echo_batcher(config, Duration::from_millis(100));
    let results = batcher
        .enqueue_many(names(&["a", "b", "c", "d", "e", "f"]))
        .await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(recorder.batches().len(), 3);
    assert_eq!(recorder.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_joins_in_flight_dispatch() {
    let (batcher, recorder) = echo_batcher(BatchConfig::default(), Duration::from_millis(100));
    let first = {
        let batcher = batcher.clone();
        tokio::spawn(async move { batcher.enqueue("home".to_string()).await })
    };
    // timer fires at 10ms; the dispatch then runs until 110ms
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recorder.batches().len(), 1);
    let second = batcher.enqueue("home".to_string()).await;
    assert_eq!(second.unwrap(), "<svg>home</svg>");
    assert_eq!(first.await.unwrap().unwrap(), "<svg>home</svg>");
    assert_eq!(recorder.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_failure_reaches_every_caller() {
    let batcher = RequestBatcher::new(
        executor_fn(|_requests: Vec<String>| async move {
            Err::<Vec<Result<String>>, _>(Error::Server {
                status: 503,
                message: "Service Unavailable".into(),
                context: ErrorContext::new(),
            })
        }),
        BatchConfig::default(),
    );
    let results = batcher
        .enqueue_many(names(&["a", "a", "b"]))
        .await;
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ServerError);
        assert_eq!(err.status_code(), Some(503));
    }
}

#[tokio::test(start_paused = true)]
async fn test_item_failure_stays_with_its_caller() {
    let batcher = RequestBatcher::new(
        executor_fn(|requests: Vec<String>| async move {
            let out: Vec<Result<String>> = requests
                .into_iter()
                .map(|name| {
                    if name == "missing" {
                        Err(Error::not_found("Icon 'missing' not found", ErrorContext::new()))
                    } else {
                        Ok(name)
                    }
                })
                .collect();
            Ok::<_, Error>(out)
        }),
        BatchConfig::default(),
    );
    let results = batcher
        .enqueue_many(names(&["home", "missing"]))
        .await;
    assert_eq!(results[0].as_ref().unwrap(), "home");
    assert_eq!(results[1].as_ref().unwrap_err().code(), ErrorCode::NotFound);
}

#[tokio::test(start_paused = true)]
async fn test_short_result_list_fails_unmatched_requests() {
    let batcher = RequestBatcher::new(
        executor_fn(|requests: Vec<String>| async move {
            let out: Vec<Result<String>> =
                requests.into_iter().take(1).map(Ok).collect();
            Ok::<_, Error>(out)
        }),
        BatchConfig::default(),
    );
    let results = batcher
        .enqueue_many(names(&["a", "b", "c"]))
        .await;
    assert_eq!(results[0].as_ref().unwrap(), "a");
    for result in &results[1..] {
        let err = result.as_ref().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unknown);
        assert!(err.message().contains("no result"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_rejects_pending_callers() {
    let config = BatchConfig::default().with_max_wait_time(Duration::from_secs(3600));
    let (batcher, recorder) = echo_batcher(config, Duration::ZERO);
    let waiting = {
        let batcher = batcher.clone();
        tokio::spawn(async move { batcher.enqueue_many(names(&["a", "a", "b"])).await })
    };
    wait_for_pending(&batcher, 2).await;
    batcher.cancel_all();
    assert_eq!(batcher.pending_count(), 0);

    let results = waiting.await.unwrap();
    for result in results {
        assert_eq!(result.unwrap_err().code(), ErrorCode::Cancelled);
    }
    assert!(recorder.batches().is_empty());

    // still usable afterwards
    let again = batcher.enqueue("c".to_string()).await;
    assert_eq!(again.unwrap(), "<svg>c</svg>");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_rejects_late_waiters_but_in_flight_settles() {
    let (batcher, recorder) = echo_batcher(BatchConfig::default(), Duration::from_millis(100));
    let carried = {
        let batcher = batcher.clone();
        tokio::spawn(async move { batcher.enqueue("home".to_string()).await })
    };
    // timer fires at 10ms; the dispatch then runs until 110ms
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recorder.batches().len(), 1);
    let late = batcher.enqueue("home".to_string());
    tokio::pin!(late);
    assert!(futures::poll!(&mut late).is_pending());
    batcher.cancel_all();

    assert_eq!(late.await.unwrap_err().code(), ErrorCode::Cancelled);
    assert_eq!(carried.await.unwrap().unwrap(), "<svg>home</svg>");
}

#[tokio::test(start_paused = true)]
async fn test_flush_dispatches_without_waiting_for_timer() {
    let config = BatchConfig::default().with_max_wait_time(Duration::from_secs(3600));
    let (batcher, recorder) = echo_batcher(config, Duration::ZERO);
    let waiting = {
        let batcher = batcher.clone();
        tokio::spawn(async move { batcher.enqueue_many(names(&["a", "b"])).await })
    };
    wait_for_pending(&batcher, 2).await;

    let started = Instant::now();
    batcher.flush().await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(batcher.pending_count(), 0);
    assert_eq!(recorder.batches(), vec![names(&["a", "b"])]);
    assert!(waiting.await.unwrap().iter().all(|r| r.is_ok()));
}

#[tokio::test(start_paused = true)]
async fn test_flush_on_idle_batcher_returns() {
    let (batcher, recorder) = echo_batcher(BatchConfig::default(), Duration::ZERO);
    batcher.flush().await;
    assert!(recorder.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_executor_panic_fails_its_dispatch_and_batcher_recovers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let batcher = RequestBatcher::new(
        executor_fn(move |requests: Vec<String>| {
            let first = c.fetch_add(1, Ordering::SeqCst) == 0;
            async move {
                if first {
                    panic!("executor exploded");
                }
                let out: Vec<Result<String>> = requests.into_iter().map(Ok).collect();
                Ok::<_, Error>(out)
            }
        }),
        BatchConfig::default(),
    );

    let failed = batcher.enqueue_many(names(&["a", "a"])).await;
    for result in failed {
        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unknown);
        assert!(err.message().contains("executor exploded"));
    }

    let next = tokio::time::timeout(Duration::from_secs(2), batcher.enqueue("b".to_string()))
        .await
        .expect("batcher stuck after executor panic");
    assert_eq!(next.unwrap(), "b");
    // "a" is no longer registered as in flight
    let again = batcher.enqueue("a".to_string()).await;
    assert_eq!(again.unwrap(), "a");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    batcher.flush().await;
}

#[tokio::test(start_paused = true)]
async fn test_zero_batch_size_dispatches_one_at_a_time() {
    let config = BatchConfig {
        max_batch_size: 0,
        ..BatchConfig::default()
    };
    let (batcher, recorder) = echo_batcher(config, Duration::ZERO);
    assert_eq!(batcher.config().max_batch_size, 1);

    let results = tokio::time::timeout(
        Duration::from_secs(2),
        batcher.enqueue_many(names(&["a", "b"])),
    )
    .await
    .expect("dispatch loop did not yield");
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(recorder.batches(), vec![names(&["a"]), names(&["b"])]);
}
