// apps/cf_cli/src/main.rs

//! CoastFE 命令行界面
//!
//! 网格点定位与扩散参考模型的演示驱动程序。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**，只通过配置文件和命令行参数组装各层。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// CoastFE 有限元网格与时间推进工具
#[derive(Parser)]
#[command(name = "cf_cli")]
#[command(author = "CoastFE Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CoastFE mesh, point location and time integration driver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行扩散模拟
    Run(commands::run::RunArgs),
    /// 显示网格与默认配置信息
    Info(commands::info::InfoArgs),
    /// 验证配置与网格文件
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // try_init 同时接管库中的 log 记录
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {e}"))?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
