// crates/cf_mesh/src/lib.rs

//! CoastFE 网格模块
//!
//! 非结构网格的几何与拓扑基底：节点、三角形/线单元、网格分解、
//! 点定位树以及挂在节点和单元上的模型数据。
//!
//! # 核心类型
//!
//! - [`Decomposition`]: 拥有全部节点与单元，维护节点-单元相邻关系
//! - [`Element`] / [`Node`]: 网格实体，各自携带 [`ModelDataSet`]
//! - [`SpatialTree`]: 点定位树，首次查询时惰性构建
//!
//! # 模块结构
//!
//! - [`geometry`]: 包围盒、节点、单元形状
//! - [`decomposition`]: 网格分解与点定位
//! - [`spatial_tree`]: 二叉空间划分树
//! - [`model_data`]: 异构模型数据与查找缓存
//! - [`coloring`]: 单元着色（并行分批）
//! - [`generation`]: 结构化网格生成
//! - [`io`]: JSON 网格快照
//!
//! # 示例
//!
//! ```rust
//! use cf_mesh::Decomposition;
//! use glam::DVec2;
//!
//! let mut mesh = Decomposition::new();
//! let a = mesh.add_node_xyz(0.0, 0.0, 0.0);
//! let b = mesh.add_node_xyz(1.0, 0.0, 0.0);
//! let c = mesh.add_node_xyz(0.0, 1.0, 0.0);
//! let t = mesh.add_triangle([a, b, c]).unwrap();
//!
//! assert_eq!(mesh.get_element(DVec2::new(0.2, 0.2)), Some(t));
//! assert_eq!(mesh.get_element(DVec2::new(1.0, 1.0)), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coloring;
pub mod decomposition;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod io;
pub mod model_data;
pub mod spatial_tree;

/// 层级标识
pub const LAYER: u8 = 2;

pub use coloring::ElementColoring;
pub use decomposition::{Decomposition, Location};
pub use error::{MeshError, MeshResult};
pub use generation::{PolylineMeshGenerator, RectMeshGenerator};
pub use geometry::{
    BoundingBox, BoundingBox3d, EdgeElement, Element, ElementGeometry, ElementKind,
    NaturalCoordinates, Node, Shape, Triangle, CONTAINMENT_EPS,
};
pub use io::{ElementRecord, MeshSnapshot};
pub use model_data::{
    LookupIndexCache, ModelDataKey, ModelDataKeys, ModelDataSet, ModelDataView, ModelRecord,
};
pub use spatial_tree::{SpatialTree, TreeNode, TreeStats};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::decomposition::{Decomposition, Location};
    pub use crate::error::{MeshError, MeshResult};
    pub use crate::geometry::{Element, ElementGeometry, ElementKind, Node};
    pub use crate::model_data::{ModelDataKey, ModelDataSet};
    pub use cf_foundation::{ElementIndex, NodeIndex};
}
