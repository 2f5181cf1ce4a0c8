// apps/cf_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 在单位正方形（或读入的网格）上推进扩散参考模型，
//! 按输出间隔报告场的极值与中心点插值。

use anyhow::{Context, Result};
use cf_physics::prelude::*;
use clap::Args;
use glam::DVec2;
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use super::{load_config, load_mesh};

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 网格快照路径（JSON）
    #[arg(short, long)]
    pub mesh: Option<PathBuf>,

    /// 生成网格每边的分段数（未指定网格时）
    #[arg(short, long, default_value = "32")]
    pub n: usize,

    /// 扩散系数
    #[arg(short, long, default_value = "0.1")]
    pub diffusivity: f64,

    /// 模拟结束时间（覆盖配置）
    #[arg(short = 't', long)]
    pub end_time: Option<f64>,

    /// 输出间隔（覆盖配置）
    #[arg(long)]
    pub output_interval: Option<f64>,

    /// 边界保持为零
    #[arg(long)]
    pub dirichlet: bool,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== CoastFE 模拟启动 ===");

    let mut config = load_config(args.config.as_deref())?;
    if let Some(end) = args.end_time {
        config.time.end = end;
    }
    if let Some(interval) = args.output_interval {
        config.time.output_interval = interval;
    }
    config.validate().context("配置无效")?;

    let mut mesh = load_mesh(args.mesh.as_deref(), args.n, &config)?;
    info!("网格: {} 节点, {} 单元", mesh.n_nodes(), mesh.n_elements());

    let bounds = mesh.bounds();
    let (min, max) = (
        DVec2::new(bounds.min_x, bounds.min_y),
        DVec2::new(bounds.max_x, bounds.max_y),
    );
    let extent = max - min;
    let mut model = DiffusionModel::new(args.diffusivity).with_initial(move |p| {
        let s = (p.truncate() - min) / extent;
        (PI * s.x).sin() * (PI * s.y).sin()
    });
    if args.dirichlet {
        let tol = 1e-9 * extent.max_element();
        model = model.with_dirichlet(move |p, _t| {
            let on_boundary = (p.x - min.x).abs() < tol
                || (p.y - min.y).abs() < tol
                || (p.x - max.x).abs() < tol
                || (p.y - max.y).abs() < tol;
            on_boundary.then_some(0.0)
        });
    }
    info!(
        "模型: 扩散系数={}, 单元循环={:?}, 积分器={:?}",
        args.diffusivity, config.engine.element_loop, config.time.integrator
    );

    let mut engine = TimeDependentApproximation::new(model, config.engine.clone());
    engine.initialize(&mut mesh).context("初始化模型数据失败")?;

    let system = FeOdeSystem::new(&mesh, engine)?;
    let state = system.initial_state()?;
    let instance = OdeInstance::from_config("diffusion", system, state, &config.engine, &config.time)?;

    let probe = (min + max) * 0.5;
    let mut coordinator = LockStepCoordinator::new(config.time.clone())?;
    coordinator
        .add_instance(instance)
        .add_observer(|t: f64, instances: &[&dyn CoupledInstance]| {
            for instance in instances {
                let state = instance.state();
                let max = state.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min = state.iter().copied().fold(f64::INFINITY, f64::min);
                let center = mesh.interpolate(probe, |n| state[n.as_usize()]);
                info!(
                    "t={:.4}: [{}] min={:.6}, max={:.6}, 中心={:?}",
                    t,
                    instance.name(),
                    min,
                    max,
                    center
                );
            }
        });

    let start = Instant::now();
    let report = coordinator.run().context("时间推进失败")?;
    let elapsed = start.elapsed();

    info!("=== 模拟完成 ===");
    info!("耦合步数: {}", report.steps);
    info!("输出次数: {}", report.outputs);
    info!("步长范围: [{:.3e}, {:.3e}]", report.min_dt, report.max_dt);
    info!("计算时间: {:.2} s", elapsed.as_secs_f64());

    Ok(())
}
