//! 下载相关的数据模型定义。
//!
//! 包含条目编号、单次尝试结果、下载结果与运行汇总等核心数据结构。

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::transport::FetchError;

/// Number of items in a full run.
pub const ITEM_COUNT: u32 = 99;

/// A file must be strictly larger than this to count as a real recording.
/// Anything at or below it is assumed to be an error page served with 2xx.
pub const MIN_VALID_BYTES: u64 = 1000;

/// One of the 99 numbered recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

impl ItemId {
    pub fn new(id: u32) -> Option<Self> {
        (1..=ITEM_COUNT).contains(&id).then_some(Self(id))
    }

    pub fn all() -> impl Iterator<Item = ItemId> {
        (1..=ITEM_COUNT).filter_map(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn file_name(self) -> String {
        format!("{:03}.mp3", self.0)
    }

    pub fn target_path(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where and how politely to fetch.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub attempt_delay: Duration,
    pub item_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("assets/audio"),
            request_timeout: Duration::from_secs(30),
            attempt_delay: Duration::from_millis(500),
            item_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Transport, HTTP status or local write failure.
    Fetch(String),
    /// Body arrived but was not larger than `MIN_VALID_BYTES`.
    TooSmall(u64),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Fetch(msg) => f.write_str(msg),
            FailureReason::TooSmall(bytes) => write!(
                f,
                "file too small ({bytes} bytes, need more than {MIN_VALID_BYTES})"
            ),
        }
    }
}

impl From<FetchError> for FailureReason {
    fn from(err: FetchError) -> Self {
        FailureReason::Fetch(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub source: &'static str,
    pub reason: FailureReason,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Result of trying a single source for a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted { bytes: u64 },
    Rejected(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    Success(u64),
    Failure(Vec<AttemptFailure>),
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadResult::Success(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub successful: usize,
    pub failed: Vec<ItemId>,
    pub results: Vec<(ItemId, DownloadResult)>,
}

impl FetchSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record(&mut self, id: ItemId, result: DownloadResult) {
        if result.is_success() {
            self.successful += 1;
        } else {
            self.failed.push(id);
        }
        self.results.push((id, result));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub done: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}
