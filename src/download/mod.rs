//! 下载流程模块入口。
//!
//! 子模块：
//! - `models`     — 数据模型（ItemId / DownloadResult / FetchSummary 等）
//! - `sources`    — 固定音频源列表与 URL 生成
//! - `transport`  — HTTP 传输抽象（`Transport`）及 reqwest 实现
//! - `progress`   — 进度快照与 CLI 进度条
//! - `fetcher`    — 多源回退下载主流程（`FallbackFetcher::fetch_all`）

pub mod fetcher;
pub mod models;
pub mod progress;
pub mod sources;
pub mod transport;
