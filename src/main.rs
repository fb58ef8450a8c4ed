//! Asma ul-Husna 音频下载器：下载 99 个名字的诵读音频，保存为 `NNN.mp3`。
//!
//! 每一项按固定顺序依次尝试各个音频源；磁盘上已存在的有效文件会被跳过，
//! 因此中断或部分失败后重新运行只会补齐缺失的文件。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/残留文件清理等基础设施
//! - `download`：音频源、传输层、多源回退下载
//! - `ui`：控制台横幅与汇总输出

use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::Path;

mod base_system;
mod download;
mod ui;

use base_system::config::load_or_create;
use base_system::context::Config;
use base_system::logging::{LogOptions, LogSystem};
use download::fetcher::FallbackFetcher;
use download::models::ITEM_COUNT;
use download::progress::ProgressReporter;
use download::transport::HttpTransport;
use tracing::{debug, error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "asma-audio-fetcher")]
#[command(about = "Download the 99 Names recitations with multi-source fallback")]
struct Cli {
    /// Echo debug logs to the console
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Directory holding config.yml and logs/
    #[arg(long)]
    data_dir: Option<String>,

    /// Print the version and exit
    #[arg(long, default_value_t = false)]
    version: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("asma-audio-fetcher v{}", VERSION);
        return Ok(());
    }

    let data_dir = cli.data_dir.as_deref().map(Path::new);
    let log = init_logging(cli.debug, data_dir)?;
    debug!("logs at {}", log.logs_dir().display());

    if let Err(err) = run(data_dir) {
        error!("run aborted: {err:#}");
        return Err(err);
    }
    Ok(())
}

fn run(data_dir: Option<&Path>) -> Result<()> {
    let config: Config = load_or_create(data_dir).map_err(|e| anyhow!(e.to_string()))?;
    let fetch_config = config.fetch_config();
    info!(
        output = %fetch_config.output_dir.display(),
        timeout_secs = fetch_config.request_timeout.as_secs(),
        "starting v{VERSION}"
    );

    let transport = HttpTransport::new(fetch_config.request_timeout)?;
    let fetcher = FallbackFetcher::new(fetch_config, transport)?;

    ui::noui::print_banner();
    let summary = if config.show_progress_bar {
        let mut reporter = ProgressReporter::with_cli_bar(ITEM_COUNT as usize);
        fetcher.fetch_all_with_progress(&mut reporter)
    } else {
        fetcher.fetch_all()
    };

    ui::noui::print_summary(&summary, &fetcher.config().output_dir);
    Ok(())
}

fn init_logging(debug: bool, base_dir: Option<&Path>) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        archive_on_exit: true,
        console: debug,
    };
    LogSystem::init_with_base(opts, base_dir).map_err(|e| anyhow!(e))
}
