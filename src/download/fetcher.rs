//! 多源回退下载主流程（支持幂等续传）。
//!
//! 在调用线程上严格按顺序处理每一项。单个音频源的任何失败（网络、状态码、
//! 文件过小、本地写入）都会转换为 `AttemptOutcome` 在此消化，不会从 `fetch_all` 抛出。

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::models::{
    AttemptFailure, AttemptOutcome, DownloadResult, FailureReason, FetchConfig, FetchSummary,
    ITEM_COUNT, ItemId, MIN_VALID_BYTES,
};
use super::progress::ProgressReporter;
use super::sources::{SOURCES, Source};
use super::transport::{FetchError, Transport};
use crate::base_system::file_cleaner::remove_partial;

pub struct FallbackFetcher<T: Transport> {
    config: FetchConfig,
    transport: T,
}

impl<T: Transport> FallbackFetcher<T> {
    /// Prepares the output directory. Failing to create it is the one error
    /// that aborts a run.
    pub fn new(config: FetchConfig, transport: T) -> Result<Self> {
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                config.output_dir.display()
            )
        })?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn fetch_all(&self) -> FetchSummary {
        let mut reporter = ProgressReporter::silent(ITEM_COUNT as usize);
        self.fetch_all_with_progress(&mut reporter)
    }

    pub fn fetch_all_with_progress(&self, reporter: &mut ProgressReporter) -> FetchSummary {
        let mut summary = FetchSummary::default();

        for id in ItemId::all() {
            let path = id.target_path(&self.config.output_dir);
            let name = id.file_name();

            if let Some(bytes) = existing_valid_size(&path) {
                reporter.println(format!("\n[{id}/{ITEM_COUNT}] {name} - Already exists"));
                debug!(item = id.get(), bytes, "skipping, valid file on disk");
                summary.record(id, DownloadResult::Success(bytes));
                reporter.item_done(true);
                continue;
            }

            reporter.println(format!("\n[{id}/{ITEM_COUNT}] Downloading {name}..."));
            let result = self.fetch_item(id, &path, reporter);
            if let DownloadResult::Failure(failures) = &result {
                reporter.println(format!("  All sources failed for {name}"));
                warn!(item = id.get(), attempts = failures.len(), "all sources failed");
            }
            reporter.item_done(result.is_success());
            summary.record(id, result);

            pause(self.config.item_delay);
        }

        reporter.finish();
        info!(
            successful = summary.successful,
            failed = summary.failed.len(),
            "fetch finished"
        );
        summary
    }

    fn fetch_item(&self, id: ItemId, path: &Path, reporter: &ProgressReporter) -> DownloadResult {
        let mut failures = Vec::new();
        for source in &SOURCES {
            reporter.println(format!("  Source: {}", source.name));
            match self.try_source(source, id, path, reporter) {
                AttemptOutcome::Accepted { bytes } => {
                    reporter.println(format!("  Downloaded ({bytes} bytes)"));
                    info!(item = id.get(), source = source.name, bytes, "downloaded");
                    return DownloadResult::Success(bytes);
                }
                AttemptOutcome::Rejected(reason) => {
                    reporter.println(format!("  Failed: {reason}"));
                    debug!(item = id.get(), source = source.name, %reason, "source rejected");
                    failures.push(AttemptFailure {
                        source: source.name,
                        reason,
                    });
                }
            }
            pause(self.config.attempt_delay);
        }
        DownloadResult::Failure(failures)
    }

    fn try_source(
        &self,
        source: &Source,
        id: ItemId,
        path: &Path,
        reporter: &ProgressReporter,
    ) -> AttemptOutcome {
        let url = source.render_url(id);
        reporter.println(format!("  Trying: {url}"));

        let reason = match self.stream_to_file(&url, path) {
            Ok(bytes) if bytes > MIN_VALID_BYTES => return AttemptOutcome::Accepted { bytes },
            Ok(bytes) => FailureReason::TooSmall(bytes),
            Err(err) => FailureReason::from(err),
        };
        discard(path);
        AttemptOutcome::Rejected(reason)
    }

    /// Writes the body straight to `path` and returns the resulting file size.
    fn stream_to_file(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.transport.fetch_into(url, &mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?;
        Ok(fs::metadata(path)?.len())
    }
}

fn existing_valid_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file() && meta.len() > MIN_VALID_BYTES)
        .map(|meta| meta.len())
}

fn discard(path: &Path) {
    if let Err(err) = remove_partial(path) {
        warn!("failed to remove {}: {err}", path.display());
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
