// apps/cf_cli/src/commands/mod.rs

//! 子命令实现

pub mod info;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use cf_config::SimulationConfig;
use cf_mesh::{Decomposition, MeshSnapshot, RectMeshGenerator};
use std::path::Path;
use tracing::info;

/// 读取配置文件，未指定时使用默认配置
pub(crate) fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            let config = SimulationConfig::from_file(path)
                .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
            info!("配置文件: {}", path.display());
            Ok(config)
        }
        None => Ok(SimulationConfig::default()),
    }
}

/// 读取网格快照，未指定时生成 n×n 单位正方形网格
pub(crate) fn load_mesh(
    path: Option<&Path>,
    n: usize,
    config: &SimulationConfig,
) -> Result<Decomposition> {
    match path {
        Some(path) => {
            let snapshot = MeshSnapshot::from_file(path)
                .with_context(|| format!("读取网格文件失败: {}", path.display()))?;
            snapshot
                .restore(config.index.clone())
                .with_context(|| format!("重建网格失败: {}", path.display()))
        }
        None => RectMeshGenerator::square(n, 1.0)
            .with_index_config(config.index.clone())
            .build()
            .context("生成网格失败"),
    }
}
