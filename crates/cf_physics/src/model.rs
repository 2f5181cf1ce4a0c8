// crates/cf_physics/src/model.rs

//! 物理模型接口
//!
//! 一个物理模型通过 [`PhysicsModel`] 提供回调：创建节点/单元私有数据、
//! 施加边界条件、单元近似（向节点累加残差并给出局部稳定步长），
//! 以及状态向量与节点数据之间的读写。
//!
//! 引擎把节点数据包在 `RwLock` 中挂到节点上。单元回调通过 [`NodeDataAccess`]
//! 以闭包形式访问本单元各节点的数据，闭包返回即释放锁。

use cf_foundation::NodeIndex;
use cf_mesh::{Decomposition, Element, ElementGeometry, Node};
use parking_lot::RwLock;

/// 物理模型回调集合
///
/// 所有回调可能在多个线程上同时被调用（不同节点、不同单元），因此模型本身必须 `Sync`。
pub trait PhysicsModel: Send + Sync {
    /// 每个节点上的私有数据
    type NodeData: Send + Sync + 'static;
    /// 每个单元上的私有数据
    type ElementData: Send + Sync + 'static;

    /// 模型名称
    fn name(&self) -> &'static str;

    /// 每个节点的自由度数
    fn dofs_per_node(&self) -> usize;

    /// 创建节点数据（初始化时每个节点调用一次）
    fn create_node_data(&self, node: &Node) -> Self::NodeData;

    /// 创建单元数据（初始化时每个单元调用一次）
    fn create_element_data(&self, element: &Element) -> Self::ElementData;

    /// 在时刻 `time` 对单个节点施加边界条件
    fn apply_boundary_condition(&self, node: &Node, data: &mut Self::NodeData, time: f64);

    /// 单元近似
    ///
    /// 向本单元节点的数据累加贡献，返回该单元的局部稳定步长；
    /// 不限制步长时返回 `f64::INFINITY`。
    fn element_approximation(
        &self,
        element: &Element,
        data: &mut Self::ElementData,
        nodes: &NodeDataAccess<'_, Self::NodeData>,
    ) -> f64;

    /// 把节点数据写成初始状态（长度为 `dofs_per_node`）
    fn initial_state(&self, node: &Node, data: &Self::NodeData, out: &mut [f64]);

    /// 从状态向量读入节点数据，并清空上一次累加的残差
    fn load_state(&self, node: &Node, data: &mut Self::NodeData, state: &[f64]);

    /// 节点上的变化率（长度为 `dofs_per_node`）
    fn rate_of_change(&self, node: &Node, data: &Self::NodeData, rate: &mut [f64]);

    /// 施加边界条件后，把被强约束的自由度写入 `out`
    ///
    /// 返回 `false` 表示该节点不受约束，`out` 保持原状态。
    fn constrained_state(&self, _node: &Node, _data: &Self::NodeData, _out: &mut [f64]) -> bool {
        false
    }
}

/// 单元回调中对本单元节点数据的访问
///
/// 局部编号 `local` 与 `element.nodes()` 的顺序一致。
/// 不要在 `read`/`update` 的闭包里再访问节点数据：同一节点重入会死锁。
pub struct NodeDataAccess<'a, D> {
    mesh: &'a Decomposition,
    records: &'a [&'a RwLock<D>],
    nodes: &'a [NodeIndex],
}

impl<'a, D> NodeDataAccess<'a, D> {
    pub(crate) fn new(
        mesh: &'a Decomposition,
        records: &'a [&'a RwLock<D>],
        element: &'a Element,
    ) -> Self {
        Self {
            mesh,
            records,
            nodes: element.nodes(),
        }
    }

    /// 本单元节点数
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 是否没有节点
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 第 `local` 个节点
    #[inline]
    pub fn node(&self, local: usize) -> &'a Node {
        self.mesh.node(self.nodes[local])
    }

    /// 读取第 `local` 个节点的数据
    pub fn read<R>(&self, local: usize, f: impl FnOnce(&D) -> R) -> R {
        let guard = self.records[self.nodes[local].as_usize()].read();
        f(&guard)
    }

    /// 修改第 `local` 个节点的数据
    pub fn update<R>(&self, local: usize, f: impl FnOnce(&mut D) -> R) -> R {
        let mut guard = self.records[self.nodes[local].as_usize()].write();
        f(&mut guard)
    }
}
