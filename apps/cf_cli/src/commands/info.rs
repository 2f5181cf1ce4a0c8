// apps/cf_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示默认配置、网格规模、点定位树统计与单元着色。

use anyhow::Result;
use cf_config::SimulationConfig;
use cf_mesh::ElementColoring;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::{load_config, load_mesh};

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 网格快照路径（JSON）
    #[arg(short, long)]
    pub mesh: Option<PathBuf>,

    /// 生成网格每边的分段数（未指定网格时）
    #[arg(short, long, default_value = "32")]
    pub n: usize,

    /// 显示默认配置
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== CoastFE 信息 ===");

    if args.defaults {
        print_default_config()?;
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    let mesh = load_mesh(args.mesh.as_deref(), args.n, &config)?;

    println!("=== 网格 ===");
    println!("节点数: {}", mesh.n_nodes());
    println!("单元数: {}", mesh.n_elements());
    let b = mesh.bounds();
    println!("范围: [{:.3}, {:.3}] x [{:.3}, {:.3}]", b.min_x, b.max_x, b.min_y, b.max_y);
    if let Some(h) = mesh.min_elm_size() {
        println!("最小单元尺寸: {:.4e}", h);
    }

    let stats = mesh.spatial_index().stats();
    println!("\n=== 点定位树 ===");
    println!("叶对象阈值: {}", mesh.spatial_index().objects_per_leaf());
    println!("叶节点数: {}", stats.n_leaves);
    println!("最大深度: {}", stats.max_depth);
    println!("最大叶对象数: {}", stats.max_leaf_size);
    println!("重复引用率: {:.3}", stats.duplication_ratio());

    let coloring = ElementColoring::from_shared_nodes(&mesh);
    println!("\n=== 单元着色 ===");
    println!("颜色数: {}", coloring.n_colors());
    println!("批次均衡度: {:.3}", coloring.balance_factor());

    Ok(())
}

fn print_default_config() -> Result<()> {
    println!("=== 默认配置 ===");
    let config = SimulationConfig::default();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
