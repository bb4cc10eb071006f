//! Types that mirror the daemon's JSON schema.

use serde::{Deserialize, Serialize};

use crate::version::VersionStatus;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Online,
    Stopped,
    Crashed,
}

impl ProcessStatus {
    pub fn is_running(self) -> bool {
        matches!(self, ProcessStatus::Online)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessStatus::Online => "online",
            ProcessStatus::Stopped => "stopped",
            ProcessStatus::Crashed => "crashed",
        }
    }
}

/// One row of the process list (`/list`). The daemon preformats cpu, mem and
/// uptime for display; they are passed through untouched.
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessItem {
    pub id: u64,
    pub name: String,
    pub status: ProcessStatus,
    #[serde(default)]
    pub pid: Option<u32>,
    pub cpu: String,
    pub mem: String,
    pub uptime: String,
    pub restarts: u64,
}

/// One frame of the per-process live stream.
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessFrame {
    pub info: ProcessInfo,
    pub stats: ProcessStats,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessInfo {
    pub status: ProcessStatus,
    #[serde(default)]
    pub pid: Option<u32>,
    pub uptime: String,
    pub name: String,
    pub command: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessStats {
    pub cpu_percent: f64,
    pub memory_usage: MemoryUsage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MemoryUsage {
    pub rss: u64,
    #[serde(default)]
    pub vms: Option<u64>,
}

/// One frame of the daemon live stream; also the shape of the one-shot
/// `/daemon/metrics` snapshot.
#[derive(Debug, Deserialize, Clone)]
pub struct DaemonMetrics {
    pub raw: RawStats,
    pub daemon: DaemonInfo,
    pub os: OsInfo,
    pub version: VersionMeta,
}

/// Chartable readings; either can be absent while the daemon warms up.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawStats {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_usage: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DaemonInfo {
    #[serde(default)]
    pub pid: Option<u32>,
    pub running: bool,
    pub uptime: String,
    pub process_count: u64,
    #[serde(default)]
    pub daemon_type: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OsInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub arch: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VersionMeta {
    pub pkg: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub build_date: String,
    #[serde(default)]
    pub target: String,
    /// Status the server last reported about itself, if any.
    #[serde(default)]
    pub status: Option<VersionStatus>,
}

impl DaemonMetrics {
    /// Placeholder for a server that could not be reached: not running, and
    /// carrying the unknown version sentinel so it classifies as behind.
    pub fn skeleton() -> Self {
        DaemonMetrics {
            raw: RawStats::default(),
            daemon: DaemonInfo {
                pid: None,
                running: false,
                uptime: "0".into(),
                process_count: 0,
                daemon_type: String::new(),
            },
            os: OsInfo::default(),
            version: VersionMeta {
                pkg: "v0.0.0".into(),
                hash: None,
                build_date: "none".into(),
                target: String::new(),
                status: None,
            },
        }
    }
}

/// Full log snapshot for one channel of one process.
#[derive(Debug, Deserialize, Clone)]
pub struct LogResponse {
    pub logs: Vec<String>,
}

/// Lifecycle actions understood by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Restart,
    Stop,
    Delete,
    Flush,
    Rename(String),
}

impl Action {
    pub fn method(&self) -> &'static str {
        match self {
            Action::Restart => "restart",
            Action::Stop => "stop",
            Action::Delete => "delete",
            Action::Flush => "flush",
            Action::Rename(_) => "rename",
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ActionBody {
    pub method: String,
}

/// Acknowledgement returned by the action endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct ActionResponse {
    pub done: bool,
    pub action: String,
}
