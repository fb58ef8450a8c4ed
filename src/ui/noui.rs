//! 无 UI 控制台输出：启动横幅与下载汇总。

use std::path::Path;

use crate::download::models::{FetchSummary, ITEM_COUNT};

const RULE_WIDTH: usize = 60;

pub fn print_banner() {
    let rule = "=".repeat(RULE_WIDTH);
    println!("{rule}");
    println!("Downloading Beautiful Recitations of Allah's 99 Names");
    println!("{rule}");
}

pub fn print_summary(summary: &FetchSummary, output_dir: &Path) {
    for line in summary_lines(summary, output_dir) {
        println!("{line}");
    }
}

fn summary_lines(summary: &FetchSummary, output_dir: &Path) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        "DOWNLOAD SUMMARY".to_string(),
        rule,
        format!("Successful: {}/{ITEM_COUNT}", summary.successful),
        format!("Failed: {}/{ITEM_COUNT}", summary.failed.len()),
    ];

    if summary.is_complete() {
        let location = output_dir
            .canonicalize()
            .unwrap_or_else(|_| output_dir.to_path_buf());
        lines.push(String::new());
        lines.push("All audio files downloaded successfully!".to_string());
        lines.push(format!("Location: {}", location.display()));
    } else {
        let ids: Vec<String> = summary.failed.iter().map(ToString::to_string).collect();
        lines.push(String::new());
        lines.push(format!("Failed files: {}", ids.join(", ")));
        lines.push(String::new());
        lines.push("You can try running the program again for failed files.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::models::{DownloadResult, ItemId};

    #[test]
    fn lists_failed_ids_and_rerun_hint() {
        let mut summary = FetchSummary::default();
        for id in ItemId::all() {
            let result = if matches!(id.get(), 3 | 57) {
                DownloadResult::Failure(Vec::new())
            } else {
                DownloadResult::Success(2000)
            };
            summary.record(id, result);
        }

        let lines = summary_lines(&summary, Path::new("assets/audio"));
        assert!(lines.contains(&"Successful: 97/99".to_string()));
        assert!(lines.contains(&"Failed: 2/99".to_string()));
        assert!(lines.contains(&"Failed files: 3, 57".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("You can try running")));
    }

    #[test]
    fn complete_run_reports_location() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut summary = FetchSummary::default();
        for id in ItemId::all() {
            summary.record(id, DownloadResult::Success(2000));
        }

        let lines = summary_lines(&summary, dir.path());
        assert!(lines.contains(&"Failed: 0/99".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("Location: ")));
        assert!(!lines.iter().any(|l| l.starts_with("Failed files")));
    }
}
