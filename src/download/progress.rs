//! 进度上报：计数快照与可选的 CLI 进度条。

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::models::ProgressSnapshot;

pub struct ProgressReporter {
    pub(crate) snapshot: ProgressSnapshot,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Reporter that only tracks counts.
    pub fn silent(total: usize) -> Self {
        Self {
            snapshot: ProgressSnapshot {
                total,
                ..ProgressSnapshot::default()
            },
            bar: None,
        }
    }

    /// Same as `silent` when stderr is not a terminal.
    pub fn with_cli_bar(total: usize) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self::silent(total);
        }
        let style = ProgressStyle::with_template(
            "{prefix} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        bar.set_style(style);
        bar.set_prefix("Recitations");

        Self::with_bar(total, bar)
    }

    fn with_bar(total: usize, bar: ProgressBar) -> Self {
        let mut reporter = Self::silent(total);
        reporter.bar = Some(bar);
        reporter
    }

    pub(crate) fn item_done(&mut self, success: bool) {
        self.snapshot.done = (self.snapshot.done + 1).min(self.snapshot.total);
        if success {
            self.snapshot.succeeded += 1;
        } else {
            self.snapshot.failed += 1;
        }
        if let Some(bar) = self.bar.as_ref() {
            bar.set_position(self.snapshot.done as u64);
        }
    }

    /// Progress lines are routed through a visible bar so they don't tear it.
    pub(crate) fn println(&self, line: impl AsRef<str>) {
        match self.visible_bar() {
            Some(bar) => bar.println(line.as_ref()),
            None => println!("{}", line.as_ref()),
        }
    }

    fn visible_bar(&self) -> Option<&ProgressBar> {
        self.bar.as_ref().filter(|bar| !bar.is_hidden())
    }

    pub(crate) fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_capped_at_total() {
        let mut reporter = ProgressReporter::silent(2);

        reporter.item_done(true);
        reporter.item_done(false);
        reporter.item_done(true);
        reporter.finish();

        assert_eq!(
            reporter.snapshot,
            ProgressSnapshot {
                done: 2,
                total: 2,
                succeeded: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn hidden_bar_sends_lines_to_stdout() {
        let bar = ProgressBar::with_draw_target(Some(3), ProgressDrawTarget::hidden());
        let mut reporter = ProgressReporter::with_bar(3, bar);

        assert!(reporter.visible_bar().is_none());
        reporter.println("[1/99] 001.mp3 - Already exists");
        reporter.item_done(true);
        assert_eq!(reporter.snapshot.done, 1);
        reporter.finish();
        assert!(reporter.bar.is_none());
    }

    #[test]
    fn silent_reporter_has_no_bar() {
        let reporter = ProgressReporter::silent(99);
        assert!(reporter.visible_bar().is_none());
    }
}
