//! 全局配置结构（Config）与默认值。
//!
//! 只开放路径与时间参数；音频源列表和有效文件大小阈值固定在
//! `download::sources` / `download::models` 中。

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};
use crate::download::models::FetchConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Paths
    #[serde(default = "default_save_path")]
    pub save_path: String,

    // Network
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_attempt_delay_ms")]
    pub attempt_delay_ms: u64,
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,

    // Console
    #[serde(default = "default_true")]
    pub show_progress_bar: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            request_timeout: default_request_timeout(),
            attempt_delay_ms: default_attempt_delay_ms(),
            item_delay_ms: default_item_delay_ms(),
            show_progress_bar: default_true(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 5] = [
            FieldMeta {
                name: "save_path",
                description: "Directory the NNN.mp3 files are written to",
            },
            FieldMeta {
                name: "request_timeout",
                description: "Per-request timeout in seconds",
            },
            FieldMeta {
                name: "attempt_delay_ms",
                description: "Pause after a failed source before trying the next one, in ms",
            },
            FieldMeta {
                name: "item_delay_ms",
                description: "Pause between items, in ms",
            },
            FieldMeta {
                name: "show_progress_bar",
                description: "Draw a progress bar on stderr while downloading",
            },
        ];
        &FIELDS
    }
}

impl Config {
    pub fn save_dir(&self) -> PathBuf {
        let trimmed = self.save_path.trim();
        if trimmed.is_empty() {
            PathBuf::from(default_save_path())
        } else {
            PathBuf::from(trimmed)
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            output_dir: self.save_dir(),
            request_timeout: Duration::from_secs(self.request_timeout.max(1)),
            attempt_delay: Duration::from_millis(self.attempt_delay_ms),
            item_delay: Duration::from_millis(self.item_delay_ms),
        }
    }
}

fn default_save_path() -> String {
    "assets/audio".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_attempt_delay_ms() -> u64 {
    500
}

fn default_item_delay_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}
