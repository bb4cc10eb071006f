//! Per-view wiring: each view owns exactly one stream and/or log tail for
//! its lifetime, and dropping the view releases both (connection closed,
//! timers cancelled). Also the concurrent server-overview fan-out.

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::warn;

use crate::api::{DaemonClient, ProcessLogSource};
use crate::error::FetchError;
use crate::history::StatsHistory;
use crate::logs::LogTailController;
use crate::stream::{StreamConnection, StreamEvent, StreamState, WsConnector};
use crate::types::{DaemonMetrics, ProcessFrame, ProcessStatus};
use crate::version::{self, Version, VersionStatus};

/// Everything the process detail view owns: the live metrics stream (ending
/// for good once the process reports stopped), the log tail, and the
/// bounded chart history.
pub struct ProcessView {
    stream: StreamConnection<ProcessFrame, WsConnector>,
    events: mpsc::UnboundedReceiver<StreamEvent<ProcessFrame>>,
    pub logs: LogTailController<ProcessLogSource>,
    pub history: StatsHistory,
    pub latest: Option<ProcessFrame>,
}

impl ProcessView {
    pub fn open(client: &DaemonClient, server: Option<&str>, id: u64) -> Self {
        let target = client.process_stream_target(server, id);
        let mut stream =
            StreamConnection::with_terminal(WsConnector, target, |frame: &ProcessFrame| {
                frame.info.status == ProcessStatus::Stopped
            });
        let events = stream.open();
        let logs = LogTailController::new(ProcessLogSource::new(
            client.clone(),
            server.map(str::to_string),
            id,
        ));
        Self {
            stream,
            events,
            logs,
            history: StatsHistory::new(),
            latest: None,
        }
    }

    /// Next stream event; samples are folded into the chart history before
    /// being handed back. `None` once the stream is gone for good.
    pub async fn next_event(&mut self) -> Option<StreamEvent<ProcessFrame>> {
        let event = self.events.recv().await?;
        if let StreamEvent::Sample(frame) = &event {
            self.history.record_process(frame);
            self.latest = Some(frame.clone());
        }
        Some(event)
    }

    pub fn state(&self) -> StreamState {
        self.stream.state()
    }

    /// Re-establish the stream, e.g. after a lifecycle action; the previous
    /// transport and any pending retry are torn down first.
    pub fn reopen(&mut self) {
        self.events = self.stream.open();
    }

    pub fn close(&mut self) {
        self.stream.close();
        self.logs.set_live(false);
    }
}

/// The daemon status view: one stream of daemon-wide metrics feeding the
/// same bounded history.
pub struct DaemonView {
    stream: StreamConnection<DaemonMetrics, WsConnector>,
    events: mpsc::UnboundedReceiver<StreamEvent<DaemonMetrics>>,
    pub history: StatsHistory,
    pub latest: Option<DaemonMetrics>,
}

impl DaemonView {
    pub fn open(client: &DaemonClient, server: Option<&str>) -> Self {
        let target = client.daemon_stream_target(server);
        let mut stream = StreamConnection::new(WsConnector, target);
        let events = stream.open();
        Self {
            stream,
            events,
            history: StatsHistory::new(),
            latest: None,
        }
    }

    pub async fn next_event(&mut self) -> Option<StreamEvent<DaemonMetrics>> {
        let event = self.events.recv().await?;
        if let StreamEvent::Sample(frame) = &event {
            self.history.record_daemon(frame);
            self.latest = Some(frame.clone());
        }
        Some(event)
    }

    pub fn state(&self) -> StreamState {
        self.stream.state()
    }

    pub fn close(&mut self) {
        self.stream.close();
    }
}

/// One row of the servers table.
#[derive(Debug, Clone)]
pub struct ServerRow {
    pub name: String,
    pub metrics: DaemonMetrics,
    pub reachable: bool,
    pub version: VersionStatus,
}

impl ServerRow {
    fn classified(name: &str, metrics: DaemonMetrics, reachable: bool, baseline: Version) -> Self {
        let remote = metrics.version.pkg.parse().unwrap_or(Version::UNKNOWN);
        let version = version::classify(baseline, remote, metrics.version.status);
        Self {
            name: name.to_string(),
            metrics,
            reachable,
            version,
        }
    }
}

/// Fetch the local daemon plus every configured remote, concurrently. The
/// remotes complete in no particular order; rows are keyed by name and
/// nothing may assume an interleaving. Unreachable servers get a skeleton
/// snapshot instead of dropping out of the table.
pub async fn server_overview(client: &DaemonClient) -> Result<Vec<ServerRow>, FetchError> {
    let local = client.daemon_metrics(None).await?;
    let baseline = local.version.pkg.parse().unwrap_or(Version::UNKNOWN);

    let names = client.list_servers().await.unwrap_or_default();
    let remotes = join_all(
        names
            .iter()
            .map(|name| client.daemon_metrics(Some(name.as_str()))),
    )
    .await;

    let mut rows = vec![ServerRow::classified("local", local, true, baseline)];
    for (name, result) in names.into_iter().zip(remotes) {
        let (metrics, reachable) = match result {
            Ok(metrics) => (metrics, true),
            Err(err) => {
                warn!(error = %err, server = %name, "server unreachable, using placeholder");
                (DaemonMetrics::skeleton(), false)
            }
        };
        rows.push(ServerRow::classified(&name, metrics, reachable, baseline));
    }
    Ok(rows)
}
