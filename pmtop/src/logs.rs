//! Pull-based log tailing: a Live/Paused polling loop over a collaborator
//! that returns the full log content every time.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::FetchError;

/// Poll period while Live.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogChannel {
    #[default]
    Stdout,
    Stderr,
}

impl LogChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogChannel::Stdout => "stdout",
            LogChannel::Stderr => "stderr",
        }
    }
}

/// The full log content of one channel, replaced wholesale on every
/// successful fetch. Nothing is merged with what was there before, so
/// upstream truncation or rotation shows up as-is. `stale` marks content
/// kept from before a failed fetch.
#[derive(Debug, Clone, Default)]
pub struct LogSnapshot {
    pub channel: LogChannel,
    pub lines: Vec<String>,
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailMode {
    Paused,
    Live,
}

/// Fetch seam: returns the full current log content for a channel.
pub trait LogSource: Send + Sync + 'static {
    fn fetch(
        &self,
        channel: LogChannel,
    ) -> impl Future<Output = Result<Vec<String>, FetchError>> + Send;
}

struct Shared<S> {
    source: S,
    channel: Mutex<LogChannel>,
    snapshot: watch::Sender<LogSnapshot>,
    scroll_pending: AtomicBool,
}

impl<S: LogSource> Shared<S> {
    async fn refresh(&self, arm_scroll: bool) {
        let channel = *self.channel.lock().unwrap();
        match self.source.fetch(channel).await {
            Ok(lines) => {
                self.snapshot.send_replace(LogSnapshot {
                    channel,
                    lines,
                    stale: false,
                });
                if arm_scroll {
                    self.scroll_pending.store(true, Ordering::Relaxed);
                }
            }
            Err(err) => {
                // Keep the previous snapshot; just mark it stale.
                warn!(error = %err, channel = channel.as_str(), "log fetch failed");
                self.snapshot.send_if_modified(|snap| {
                    if snap.stale {
                        false
                    } else {
                        snap.stale = true;
                        true
                    }
                });
            }
        }
    }
}

/// Owns the current log snapshot and, while Live, the poll timer. Starts
/// Paused. Dropping the controller cancels the timer; no fetch fires after
/// that.
pub struct LogTailController<S: LogSource> {
    shared: Arc<Shared<S>>,
    mode: TailMode,
    poll_task: Option<JoinHandle<()>>,
}

impl<S: LogSource> LogTailController<S> {
    pub fn new(source: S) -> Self {
        Self::with_channel(source, LogChannel::Stdout)
    }

    pub fn with_channel(source: S, channel: LogChannel) -> Self {
        let (snapshot, _) = watch::channel(LogSnapshot {
            channel,
            ..Default::default()
        });
        Self {
            shared: Arc::new(Shared {
                source,
                channel: Mutex::new(channel),
                snapshot,
                scroll_pending: AtomicBool::new(false),
            }),
            mode: TailMode::Paused,
            poll_task: None,
        }
    }

    pub fn mode(&self) -> TailMode {
        self.mode
    }

    pub fn channel(&self) -> LogChannel {
        *self.shared.channel.lock().unwrap()
    }

    /// Current snapshot (cloned out of the watch slot).
    pub fn snapshot(&self) -> LogSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Change notifications for the snapshot.
    pub fn watch_snapshot(&self) -> watch::Receiver<LogSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// One-shot fetch; replaces the snapshot regardless of mode.
    pub async fn fetch(&self) {
        self.shared.refresh(false).await;
    }

    /// Switch the active channel and fetch it immediately, Live or not.
    pub async fn set_channel(&mut self, channel: LogChannel) {
        *self.shared.channel.lock().unwrap() = channel;
        self.shared.refresh(false).await;
    }

    /// Enable or disable polling. While Live the content is re-fetched on a
    /// fixed interval and the scroll-to-latest flag armed after each
    /// successful poll. Idempotent in both directions.
    pub fn set_live(&mut self, live: bool) {
        match (self.mode, live) {
            (TailMode::Live, true) | (TailMode::Paused, false) => {}
            (TailMode::Paused, true) => {
                let shared = Arc::clone(&self.shared);
                self.poll_task = Some(tokio::spawn(async move {
                    loop {
                        tokio::time::sleep(POLL_INTERVAL).await;
                        shared.refresh(true).await;
                    }
                }));
                self.mode = TailMode::Live;
            }
            (TailMode::Live, false) => {
                if let Some(task) = self.poll_task.take() {
                    task.abort();
                }
                self.mode = TailMode::Paused;
            }
        }
    }

    /// Opening the search UI pauses live tailing as a side effect. Clearing
    /// the search never resumes it; that is always an explicit `set_live`.
    pub fn open_search(&mut self) {
        self.set_live(false);
    }

    /// True once after each successful Live poll; the caller scrolls to the
    /// latest line and the flag rearms on the next poll.
    pub fn take_scroll_to_latest(&self) -> bool {
        self.shared.scroll_pending.swap(false, Ordering::Relaxed)
    }
}

impl<S: LogSource> Drop for LogTailController<S> {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}
