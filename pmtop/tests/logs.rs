//! Live/Paused polling behavior of the log tail controller, driven by a
//! scripted fetch collaborator under paused tokio time.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pmtop::error::FetchError;
use pmtop::logs::{LogChannel, LogSource, LogTailController, TailMode, POLL_INTERVAL};

#[derive(Clone, Default)]
struct ScriptedLogs {
    responses: Arc<Mutex<VecDeque<Result<Vec<String>, FetchError>>>>,
    fetched: Arc<Mutex<Vec<LogChannel>>>,
    fetches: Arc<AtomicUsize>,
}

impl ScriptedLogs {
    fn push(&self, response: Result<Vec<String>, FetchError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn push_lines(&self, lines: &[&str]) {
        self.push(Ok(lines.iter().map(|s| s.to_string()).collect()));
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn channels(&self) -> Vec<LogChannel> {
        self.fetched.lock().unwrap().clone()
    }
}

impl LogSource for ScriptedLogs {
    fn fetch(
        &self,
        channel: LogChannel,
    ) -> impl Future<Output = Result<Vec<String>, FetchError>> + Send {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(channel);
        let next = self.responses.lock().unwrap().pop_front();
        async move { next.unwrap_or_else(|| Ok(Vec::new())) }
    }
}

fn fetch_failure() -> FetchError {
    FetchError::Status(reqwest::StatusCode::BAD_GATEWAY)
}

#[tokio::test(start_paused = true)]
async fn live_polls_replace_the_snapshot_wholesale() {
    let source = ScriptedLogs::default();
    source.push_lines(&["a", "b"]);
    source.push_lines(&["x"]);

    let mut tail = LogTailController::new(source.clone());
    assert_eq!(tail.mode(), TailMode::Paused);

    let mut updates = tail.watch_snapshot();
    let started = tokio::time::Instant::now();
    tail.set_live(true);
    assert_eq!(tail.mode(), TailMode::Live);

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().lines, vec!["a", "b"]);
    assert_eq!(started.elapsed(), POLL_INTERVAL);

    updates.changed().await.unwrap();
    let snapshot = updates.borrow_and_update().clone();
    // Full replacement: nothing of the previous snapshot survives
    assert_eq!(snapshot.lines, vec!["x"]);
    assert!(!snapshot.stale);
    assert_eq!(started.elapsed(), POLL_INTERVAL * 2);

    // Each successful live poll arms scroll-to-latest once
    assert!(tail.take_scroll_to_latest());
    assert!(!tail.take_scroll_to_latest());
}

#[tokio::test]
async fn failed_fetch_keeps_the_previous_snapshot_as_stale() {
    let source = ScriptedLogs::default();
    source.push_lines(&["kept line"]);
    source.push(Err(fetch_failure()));

    let tail = LogTailController::new(source);
    tail.fetch().await;
    let snapshot = tail.snapshot();
    assert_eq!(snapshot.lines, vec!["kept line"]);
    assert!(!snapshot.stale);

    tail.fetch().await;
    let snapshot = tail.snapshot();
    assert_eq!(snapshot.lines, vec!["kept line"]);
    assert!(snapshot.stale);
}

#[tokio::test(start_paused = true)]
async fn search_pauses_polling_and_clearing_does_not_resume() {
    let source = ScriptedLogs::default();
    let mut tail = LogTailController::new(source.clone());

    tail.set_live(true);
    // let the poll task arm its timer before advancing the clock
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    tokio::time::advance(POLL_INTERVAL).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(source.fetches(), 1);

    tail.open_search();
    assert_eq!(tail.mode(), TailMode::Paused);

    // The query being cleared again is a consumer-side event; nothing here
    // may restart the timer on its own
    let before = source.fetches();
    tokio::time::advance(POLL_INTERVAL * 4).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(source.fetches(), before);
    assert_eq!(tail.mode(), TailMode::Paused);
}

#[tokio::test]
async fn switching_channels_fetches_immediately_even_while_paused() {
    let source = ScriptedLogs::default();
    source.push_lines(&["out"]);
    source.push_lines(&["err"]);

    let mut tail = LogTailController::new(source.clone());
    tail.fetch().await;
    assert_eq!(tail.snapshot().channel, LogChannel::Stdout);

    tail.set_channel(LogChannel::Stderr).await;
    assert_eq!(tail.mode(), TailMode::Paused);
    let snapshot = tail.snapshot();
    assert_eq!(snapshot.channel, LogChannel::Stderr);
    assert_eq!(snapshot.lines, vec!["err"]);
    assert_eq!(
        source.channels(),
        vec![LogChannel::Stdout, LogChannel::Stderr]
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_controller_cancels_the_poll_timer() {
    let source = ScriptedLogs::default();
    let mut tail = LogTailController::new(source.clone());
    tail.set_live(true);
    drop(tail);

    tokio::time::advance(POLL_INTERVAL * 3).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(source.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn set_live_is_idempotent() {
    let source = ScriptedLogs::default();
    let mut tail = LogTailController::new(source.clone());
    tail.set_live(true);
    tail.set_live(true);

    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    tokio::time::advance(POLL_INTERVAL).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    // One timer, one fetch per interval
    assert_eq!(source.fetches(), 1);

    tail.set_live(false);
    tail.set_live(false);
    assert_eq!(tail.mode(), TailMode::Paused);
}
