// apps/cf_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 验证配置文件与网格快照：配置取值、节点引用、相邻关系与退化单元。

use anyhow::{bail, Result};
use cf_config::SimulationConfig;
use cf_mesh::{ElementGeometry, MeshSnapshot};
use clap::Args;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 网格快照路径（JSON）
    #[arg(short, long)]
    pub mesh: Option<PathBuf>,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== CoastFE 配置验证 ===");

    let mut result = ValidationResult::default();
    let mut config = SimulationConfig::default();

    if let Some(path) = &args.config {
        info!("验证配置文件: {}", path.display());
        match SimulationConfig::from_file(path) {
            Ok(loaded) => match loaded.validate() {
                Ok(()) => config = loaded,
                Err(e) => result.add_error(format!("配置无效: {e}")),
            },
            Err(e) => result.add_error(format!("无法读取配置: {e}")),
        }
    }

    if let Some(path) = &args.mesh {
        info!("验证网格文件: {}", path.display());
        match MeshSnapshot::from_file(path).and_then(|s| s.restore(config.index.clone())) {
            Ok(mesh) => {
                if let Err(e) = mesh.validate() {
                    result.add_error(format!("网格拓扑错误: {e}"));
                }
                let orphans = mesh.nodes().iter().filter(|n| n.elements().is_empty()).count();
                if orphans > 0 {
                    result.add_warning(format!("{orphans} 个节点未被任何单元引用"));
                }
                let tiny = mesh
                    .elements()
                    .iter()
                    .filter(|e| e.elm_size() < cf_config::MIN_CELL_SIZE)
                    .count();
                if tiny > 0 {
                    result.add_warning(format!(
                        "{tiny} 个单元尺寸小于 {}",
                        cf_config::MIN_CELL_SIZE
                    ));
                }
                info!("网格: {} 节点, {} 单元", mesh.n_nodes(), mesh.n_elements());
            }
            Err(e) => result.add_error(format!("无法加载网格: {e}")),
        }
    }

    if args.config.is_none() && args.mesh.is_none() {
        warn!("未指定配置或网格文件，仅检查默认配置");
        if let Err(e) = config.validate() {
            result.add_error(format!("默认配置无效: {e}"));
        }
    }

    for w in &result.warnings {
        warn!("{w}");
    }
    for e in &result.errors {
        error!("{e}");
    }

    if !result.is_ok(args.strict) {
        bail!(
            "验证失败: {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        );
    }
    info!("验证通过");
    Ok(())
}
