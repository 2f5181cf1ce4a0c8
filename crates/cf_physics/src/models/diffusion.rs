// crates/cf_physics/src/models/diffusion.rs

//! 线性单元扩散模型
//!
//! 求解标量扩散方程
//!
//! ```text
//! ∂u/∂t = D ∇²u
//! ```
//!
//! 采用集中质量的线性有限元半离散：
//!
//! ```text
//! M_i du_i/dt = -Σ_e Σ_j D |e| (∇N_i · ∇N_j) u_j
//! ```
//!
//! 第一类边界节点的变化率为零，值由边界函数直接给定。
//! 单元稳定步长取 `cfl · h² / D`，h 为单元尺寸。

use cf_mesh::{Element, ElementGeometry, Node};
use glam::{DVec2, DVec3};

use crate::model::{NodeDataAccess, PhysicsModel};

/// 默认扩散稳定系数
pub const DEFAULT_DIFFUSION_CFL: f64 = 0.2;

type InitialFn = Box<dyn Fn(DVec3) -> f64 + Send + Sync>;
type DirichletFn = Box<dyn Fn(DVec3, f64) -> Option<f64> + Send + Sync>;

/// 节点数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffusionNode {
    /// 当前值
    pub value: f64,
    /// 单元循环累加的残差
    pub residual: f64,
    /// 第一类边界值（非边界节点为 `None`）
    pub boundary: Option<f64>,
}

/// 单元数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffusionElement {
    /// 各局部节点的形函数梯度
    pub gradients: Vec<DVec2>,
    /// 单元面积（线单元为长度）
    pub volume: f64,
    /// 单元尺寸
    pub size: f64,
}

/// 扩散模型
pub struct DiffusionModel {
    diffusivity: f64,
    cfl: f64,
    initial: InitialFn,
    dirichlet: Option<DirichletFn>,
}

impl std::fmt::Debug for DiffusionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffusionModel")
            .field("diffusivity", &self.diffusivity)
            .field("cfl", &self.cfl)
            .field("has_dirichlet", &self.dirichlet.is_some())
            .finish()
    }
}

impl DiffusionModel {
    /// 创建模型，初始值为零、无边界条件
    pub fn new(diffusivity: f64) -> Self {
        Self {
            diffusivity,
            cfl: DEFAULT_DIFFUSION_CFL,
            initial: Box::new(|_| 0.0),
            dirichlet: None,
        }
    }

    /// 设置初始值
    pub fn with_initial<F>(mut self, initial: F) -> Self
    where
        F: Fn(DVec3) -> f64 + Send + Sync + 'static,
    {
        self.initial = Box::new(initial);
        self
    }

    /// 设置第一类边界条件
    ///
    /// 函数对边界节点返回 `Some(值)`，对内部节点返回 `None`。
    pub fn with_dirichlet<F>(mut self, boundary: F) -> Self
    where
        F: Fn(DVec3, f64) -> Option<f64> + Send + Sync + 'static,
    {
        self.dirichlet = Some(Box::new(boundary));
        self
    }

    /// 设置稳定系数
    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// 扩散系数
    pub fn diffusivity(&self) -> f64 {
        self.diffusivity
    }

    /// 稳定系数
    pub fn cfl(&self) -> f64 {
        self.cfl
    }
}

impl PhysicsModel for DiffusionModel {
    type NodeData = DiffusionNode;
    type ElementData = DiffusionElement;

    fn name(&self) -> &'static str {
        "diffusion"
    }

    fn dofs_per_node(&self) -> usize {
        1
    }

    fn create_node_data(&self, node: &Node) -> DiffusionNode {
        DiffusionNode {
            value: (self.initial)(node.position()),
            residual: 0.0,
            boundary: None,
        }
    }

    fn create_element_data(&self, element: &Element) -> DiffusionElement {
        DiffusionElement {
            gradients: (0..element.n_nodes())
                .map(|local| element.shape_gradient(local))
                .collect(),
            volume: element.volume(),
            size: element.elm_size(),
        }
    }

    fn apply_boundary_condition(&self, node: &Node, data: &mut DiffusionNode, time: f64) {
        let Some(dirichlet) = &self.dirichlet else {
            return;
        };
        data.boundary = dirichlet(node.position(), time);
        if let Some(value) = data.boundary {
            data.value = value;
        }
    }

    fn element_approximation(
        &self,
        _element: &Element,
        data: &mut DiffusionElement,
        nodes: &NodeDataAccess<'_, DiffusionNode>,
    ) -> f64 {
        let n = nodes.len();
        let mut values = [0.0; 3];
        for (local, value) in values.iter_mut().enumerate().take(n) {
            *value = nodes.read(local, |d| d.value);
        }

        let scale = self.diffusivity * data.volume;
        for i in 0..n {
            let flux: f64 = (0..n)
                .map(|j| data.gradients[i].dot(data.gradients[j]) * values[j])
                .sum();
            nodes.update(i, |d| d.residual -= scale * flux);
        }

        if self.diffusivity > 0.0 {
            self.cfl * data.size * data.size / self.diffusivity
        } else {
            f64::INFINITY
        }
    }

    fn initial_state(&self, _node: &Node, data: &DiffusionNode, out: &mut [f64]) {
        out[0] = data.value;
    }

    fn load_state(&self, _node: &Node, data: &mut DiffusionNode, state: &[f64]) {
        data.value = state[0];
        data.residual = 0.0;
    }

    fn rate_of_change(&self, node: &Node, data: &DiffusionNode, rate: &mut [f64]) {
        let mass = node.lumped_mass();
        rate[0] = if data.boundary.is_some() || mass <= 0.0 {
            0.0
        } else {
            data.residual / mass
        };
    }

    fn constrained_state(&self, _node: &Node, data: &DiffusionNode, out: &mut [f64]) -> bool {
        match data.boundary {
            Some(value) => {
                out[0] = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approximation::TimeDependentApproximation;
    use cf_config::EngineConfig;
    use cf_mesh::RectMeshGenerator;

    #[test]
    fn test_linear_field_has_zero_interior_residual() {
        // 线性场的离散拉普拉斯在内部节点为零
        let generator = RectMeshGenerator::new(4, 4, 1.0, 1.0);
        let mut mesh = generator.build().unwrap();
        let model = DiffusionModel::new(1.0).with_initial(|p| 2.0 * p.x - p.y + 0.5);
        let mut engine = TimeDependentApproximation::new(model, EngineConfig::deterministic());
        engine.initialize(&mut mesh).unwrap();
        engine.perform_element_loop(&mesh).unwrap();

        let records = engine.node_records(&mesh).unwrap();
        for (i, record) in records.iter().enumerate() {
            let node = cf_foundation::NodeIndex::from_usize(i);
            if !generator.is_boundary(node) {
                assert!(record.read().residual.abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_constant_field_has_zero_residual() {
        let mut mesh = RectMeshGenerator::new(3, 2, 3.0, 2.0).build().unwrap();
        let model = DiffusionModel::new(0.5).with_initial(|_| 7.0);
        let mut engine = TimeDependentApproximation::new(model, EngineConfig::default());
        engine.initialize(&mut mesh).unwrap();
        engine.perform_element_loop(&mesh).unwrap();
        for record in engine.node_records(&mesh).unwrap() {
            assert!(record.read().residual.abs() < 1e-12);
        }
    }

    #[test]
    fn test_stable_step() {
        let mut mesh = RectMeshGenerator::new(2, 2, 2.0, 2.0).build().unwrap();
        let model = DiffusionModel::new(0.1).with_cfl(0.25);
        let config = EngineConfig {
            max_time_step: 10.0,
            ..Default::default()
        };
        let mut engine = TimeDependentApproximation::new(model, config);
        engine.initialize(&mut mesh).unwrap();
        let dt = engine.perform_element_loop(&mesh).unwrap();
        // h = 1/√2, h² = 0.5，单元步长 1.25 低于引擎上限
        assert!((dt - 0.25 * 0.5 / 0.1).abs() < 1e-12);
        assert_eq!(engine.max_time_step(), dt);
    }

    #[test]
    fn test_dirichlet_nodes_frozen() {
        let mut mesh = RectMeshGenerator::new(2, 2, 1.0, 1.0).build().unwrap();
        let model = DiffusionModel::new(1.0)
            .with_initial(|p| p.x)
            .with_dirichlet(|p, t| (p.x == 0.0).then_some(t));
        let mut engine = TimeDependentApproximation::new(model, EngineConfig::default());
        engine.initialize(&mut mesh).unwrap();
        engine.set_boundary_conditions(&mesh, 2.0).unwrap();
        engine.perform_element_loop(&mesh).unwrap();

        let records = engine.node_records(&mesh).unwrap();
        for (node, record) in mesh.nodes().iter().zip(&records) {
            let data = record.read();
            let mut rate = [f64::NAN];
            engine.model().rate_of_change(node, &data, &mut rate);
            let mut constrained = [f64::NAN];
            let is_constrained = engine.model().constrained_state(node, &data, &mut constrained);
            if node.xy().x == 0.0 {
                assert_eq!(data.value, 2.0);
                assert_eq!(rate[0], 0.0);
                assert!(is_constrained);
                assert_eq!(constrained[0], 2.0);
            } else {
                assert!(data.boundary.is_none());
                assert!(rate[0].is_finite());
                assert!(!is_constrained);
                assert!(constrained[0].is_nan());
            }
        }
    }
}
