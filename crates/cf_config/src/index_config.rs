// crates/cf_config/src/index_config.rs

//! 点定位树配置
//!
//! 递归深度上限与最小单元格尺寸是防止无界递归的保护阈值，
//! 不属于可调参数，因此以常量形式给出。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 递归深度硬上限
pub const MAX_TREE_DEPTH: usize = 100;

/// 单元格最小宽/高 [地图单位]，低于此值不再划分
pub const MIN_CELL_SIZE: f64 = 0.01;

/// 退化划分检查生效的最小深度（深度大于此值才放弃划分）
pub const DEGENERATE_SPLIT_DEPTH: usize = 5;

/// 每叶最少对象数的下限（`max(100, n^(1/3))` 中的 100）
pub const DEFAULT_OBJECTS_PER_LEAF: usize = 100;

/// 划分方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitAxis {
    /// 沿 x 方向划分（分割线垂直于 x 轴）
    X,
    /// 沿 y 方向划分
    Y,
}

impl SplitAxis {
    /// 坐标分量下标
    #[inline]
    pub fn component(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }
}

/// 点定位树配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialIndexConfig {
    /// 每叶对象数下限，实际使用 `max(该值, n_elements^(1/3))`
    #[serde(default = "default_objects_per_leaf")]
    pub min_objects_per_leaf: usize,

    /// 强制划分方向；`None` 时每层选较宽的方向
    #[serde(default)]
    pub direction: Option<SplitAxis>,

    /// 根节点两棵子树是否并行构建
    #[serde(default = "default_parallel_root")]
    pub parallel_root: bool,
}

fn default_objects_per_leaf() -> usize { DEFAULT_OBJECTS_PER_LEAF }
fn default_parallel_root() -> bool { true }

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        Self {
            min_objects_per_leaf: default_objects_per_leaf(),
            direction: None,
            parallel_root: default_parallel_root(),
        }
    }
}

impl SpatialIndexConfig {
    /// 根据单元数计算每叶最大对象数
    ///
    /// `max(min_objects_per_leaf, n_elements^(1/3))`
    pub fn objects_per_leaf(&self, n_elements: usize) -> usize {
        let cube_root = (n_elements as f64).cbrt() as usize;
        self.min_objects_per_leaf.max(cube_root)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_objects_per_leaf == 0 {
            return Err(ConfigError::invalid_value(
                "index.min_objects_per_leaf",
                self.min_objects_per_leaf,
                "每叶对象数必须为正",
            ));
        }
        Ok(())
    }
}
