// crates/cf_physics/src/approximation.rs

//! 时间相关有限元近似引擎
//!
//! # 生命周期
//!
//! ```text
//! 未初始化 ──initial_dofs──> 节点数据就绪 ──initial_element_model_data──> 就绪
//!                                     │                                  │
//!                           set_boundary_conditions            perform_element_loop
//! ```
//!
//! 引擎为每个节点/单元追加一条 `RwLock<数据>` 记录，并保存按节点（单元）排列的句柄表，
//! 访问时不依赖各节点的追加顺序。
//!
//! # 单元循环
//!
//! - `Colored`: 按着色批次执行，同批并行；批内单元不共享节点，写入无竞争，结果确定；
//! - `Sequential`: 按单元编号串行；
//! - `Unordered`: 全部单元一次性并行，累加顺序不确定。
//!
//! 各单元返回的局部稳定步长取最小值，只会降低 `max_time_step`，不会提高。

use cf_config::{ElementLoopMode, EngineConfig};
use cf_foundation::ElementIndex;
use cf_mesh::{Decomposition, ElementColoring, ModelDataKeys};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::error::{PhysicsError, PhysicsResult};
use crate::model::{NodeDataAccess, PhysicsModel};

type NodeRecord<M> = RwLock<<M as PhysicsModel>::NodeData>;
type ElementRecord<M> = RwLock<<M as PhysicsModel>::ElementData>;

/// 时间相关近似引擎
pub struct TimeDependentApproximation<M: PhysicsModel> {
    model: M,
    config: EngineConfig,
    node_keys: Option<ModelDataKeys<NodeRecord<M>>>,
    element_keys: Option<ModelDataKeys<ElementRecord<M>>>,
    coloring: Option<ElementColoring>,
    max_time_step: f64,
}

impl<M: PhysicsModel> TimeDependentApproximation<M> {
    /// 创建引擎
    pub fn new(model: M, config: EngineConfig) -> Self {
        let max_time_step = config.max_time_step;
        Self {
            model,
            config,
            node_keys: None,
            element_keys: None,
            coloring: None,
            max_time_step,
        }
    }

    /// 物理模型
    pub fn model(&self) -> &M {
        &self.model
    }

    /// 引擎配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 是否已完成全部初始化
    pub fn is_ready(&self) -> bool {
        self.node_keys.is_some() && self.element_keys.is_some()
    }

    /// 当前时间步上限
    #[inline]
    pub fn max_time_step(&self) -> f64 {
        self.max_time_step
    }

    /// 设置时间步上限（每个耦合步开始时调用）
    pub fn set_max_time_step(&mut self, dt: f64) {
        self.max_time_step = dt;
    }

    /// 为每个节点创建并挂载节点数据
    pub fn initial_dofs(&mut self, mesh: &mut Decomposition) -> PhysicsResult<()> {
        if self.node_keys.is_some() {
            return Err(PhysicsError::AlreadyInitialized { what: "initial_dofs" });
        }
        let mut keys = ModelDataKeys::with_capacity(mesh.n_nodes());
        for node in mesh.nodes_mut() {
            let data = self.model.create_node_data(node);
            keys.push(node.add_model_data(RwLock::new(data)));
        }
        log::debug!("{}: 已挂载 {} 个节点数据", self.model.name(), keys.len());
        self.node_keys = Some(keys);
        Ok(())
    }

    /// 为每个单元创建并挂载单元数据
    pub fn initial_element_model_data(&mut self, mesh: &mut Decomposition) -> PhysicsResult<()> {
        if self.element_keys.is_some() {
            return Err(PhysicsError::AlreadyInitialized {
                what: "initial_element_model_data",
            });
        }
        let mut keys = ModelDataKeys::with_capacity(mesh.n_elements());
        for element in mesh.elements_mut() {
            let data = self.model.create_element_data(element);
            keys.push(element.add_model_data(RwLock::new(data)));
        }
        log::debug!("{}: 已挂载 {} 个单元数据", self.model.name(), keys.len());
        self.element_keys = Some(keys);
        Ok(())
    }

    /// 依次完成节点与单元数据初始化
    pub fn initialize(&mut self, mesh: &mut Decomposition) -> PhysicsResult<()> {
        self.initial_dofs(mesh)?;
        self.initial_element_model_data(mesh)
    }

    /// 按节点顺序解析出节点记录
    pub fn node_records<'m>(&self, mesh: &'m Decomposition) -> PhysicsResult<Vec<&'m NodeRecord<M>>> {
        let keys = self.node_keys.as_ref().ok_or(PhysicsError::NotInitialized {
            operation: "node_records",
            requires: "initial_dofs",
        })?;
        if keys.len() != mesh.n_nodes() {
            return Err(PhysicsError::MeshMismatch {
                entity: "node",
                expected: keys.len(),
                actual: mesh.n_nodes(),
            });
        }
        mesh.nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let key = keys.get(i).ok_or(PhysicsError::MeshMismatch {
                    entity: "node",
                    expected: keys.len(),
                    actual: mesh.n_nodes(),
                })?;
                Ok(node.model_data().get(key)?)
            })
            .collect()
    }

    fn element_records<'m>(
        &self,
        mesh: &'m Decomposition,
    ) -> PhysicsResult<Vec<&'m ElementRecord<M>>> {
        let keys = self.element_keys.as_ref().ok_or(PhysicsError::NotInitialized {
            operation: "perform_element_loop",
            requires: "initial_element_model_data",
        })?;
        if keys.len() != mesh.n_elements() {
            return Err(PhysicsError::MeshMismatch {
                entity: "element",
                expected: keys.len(),
                actual: mesh.n_elements(),
            });
        }
        mesh.elements()
            .iter()
            .enumerate()
            .map(|(i, element)| {
                let key = keys.get(i).ok_or(PhysicsError::MeshMismatch {
                    entity: "element",
                    expected: keys.len(),
                    actual: mesh.n_elements(),
                })?;
                Ok(element.model_data().get(key)?)
            })
            .collect()
    }

    /// 在时刻 `time` 对所有节点施加边界条件
    pub fn set_boundary_conditions(&self, mesh: &Decomposition, time: f64) -> PhysicsResult<()> {
        let records = self.node_records(mesh)?;
        let model = &self.model;
        if self.config.parallel_boundary {
            records
                .par_iter()
                .zip(mesh.nodes().par_iter())
                .for_each(|(record, node)| {
                    model.apply_boundary_condition(node, &mut record.write(), time);
                });
        } else {
            for (record, node) in records.iter().zip(mesh.nodes()) {
                model.apply_boundary_condition(node, &mut record.write(), time);
            }
        }
        Ok(())
    }

    /// 执行单元循环，返回本次循环后的时间步上限
    pub fn perform_element_loop(&mut self, mesh: &Decomposition) -> PhysicsResult<f64> {
        let node_records = self.node_records(mesh)?;
        let element_records = self.element_records(mesh)?;

        if self.config.element_loop == ElementLoopMode::Colored {
            let stale = self
                .coloring
                .as_ref()
                .map_or(true, |c| c.batches().iter().map(Vec::len).sum::<usize>() != mesh.n_elements());
            if stale {
                log::debug!("{}: 重新着色 {} 个单元", self.model.name(), mesh.n_elements());
                self.coloring = Some(mesh.element_coloring());
            }
        }

        let model = &self.model;
        let run = |e: ElementIndex| -> f64 {
            let element = mesh.element(e);
            let access = NodeDataAccess::new(mesh, &node_records, element);
            let mut data = element_records[e.as_usize()].write();
            model.element_approximation(element, &mut data, &access)
        };

        let local_min = match self.config.element_loop {
            ElementLoopMode::Sequential => (0..mesh.n_elements())
                .map(|e| run(ElementIndex::from_usize(e)))
                .fold(f64::INFINITY, f64::min),
            ElementLoopMode::Unordered => (0..mesh.n_elements())
                .into_par_iter()
                .map(|e| run(ElementIndex::from_usize(e)))
                .reduce(|| f64::INFINITY, f64::min),
            ElementLoopMode::Colored => {
                let mut dt = f64::INFINITY;
                if let Some(coloring) = &self.coloring {
                    for batch in coloring.batches() {
                        let batch_min = batch
                            .par_iter()
                            .map(|&e| run(e))
                            .reduce(|| f64::INFINITY, f64::min);
                        dt = dt.min(batch_min);
                    }
                }
                dt
            }
        };

        if local_min < self.max_time_step {
            log::trace!(
                "{}: 时间步上限 {:.3e} -> {:.3e}",
                self.model.name(),
                self.max_time_step,
                local_min
            );
            self.max_time_step = local_min;
        }
        Ok(self.max_time_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_mesh::{Element, ElementGeometry, Node, RectMeshGenerator};

    /// 每个单元给各节点加 1，稳定步长取单元尺寸
    struct CountingModel;

    impl PhysicsModel for CountingModel {
        type NodeData = f64;
        type ElementData = usize;

        fn name(&self) -> &'static str {
            "counting"
        }
        fn dofs_per_node(&self) -> usize {
            1
        }
        fn create_node_data(&self, _node: &Node) -> f64 {
            0.0
        }
        fn create_element_data(&self, _element: &Element) -> usize {
            0
        }
        fn apply_boundary_condition(&self, node: &Node, data: &mut f64, time: f64) {
            if node.xy().x == 0.0 {
                *data = time;
            }
        }
        fn element_approximation(
            &self,
            element: &Element,
            data: &mut usize,
            nodes: &NodeDataAccess<'_, f64>,
        ) -> f64 {
            *data += 1;
            for local in 0..nodes.len() {
                nodes.update(local, |v| *v += 1.0);
            }
            element.elm_size()
        }
        fn initial_state(&self, _node: &Node, data: &f64, out: &mut [f64]) {
            out[0] = *data;
        }
        fn load_state(&self, _node: &Node, data: &mut f64, state: &[f64]) {
            *data = state[0];
        }
        fn rate_of_change(&self, _node: &Node, data: &f64, rate: &mut [f64]) {
            rate[0] = *data;
        }
    }

    fn run_mode(mode: ElementLoopMode) -> (Vec<f64>, f64) {
        let mut mesh = RectMeshGenerator::new(4, 3, 4.0, 3.0).build().unwrap();
        let config = EngineConfig {
            element_loop: mode,
            ..Default::default()
        };
        let mut engine = TimeDependentApproximation::new(CountingModel, config);
        engine.initialize(&mut mesh).unwrap();
        let dt = engine.perform_element_loop(&mesh).unwrap();
        let values = engine
            .node_records(&mesh)
            .unwrap()
            .iter()
            .map(|r| *r.read())
            .collect();
        (values, dt)
    }

    #[test]
    fn test_loop_modes_agree() {
        let (sequential, dt_seq) = run_mode(ElementLoopMode::Sequential);
        let (colored, dt_col) = run_mode(ElementLoopMode::Colored);
        let (unordered, dt_un) = run_mode(ElementLoopMode::Unordered);
        assert_eq!(sequential, colored);
        assert_eq!(sequential, unordered);
        assert_eq!(dt_seq, dt_col);
        assert_eq!(dt_seq, dt_un);
        // 节点累加值等于相邻单元数
        assert_eq!(sequential[0], 2.0);
    }

    #[test]
    fn test_max_time_step_only_decreases() {
        let mut mesh = RectMeshGenerator::new(2, 2, 2.0, 2.0).build().unwrap();
        let mut engine = TimeDependentApproximation::new(CountingModel, EngineConfig::default());
        engine.initialize(&mut mesh).unwrap();

        // 单元最小高为 1/√2
        let dt = engine.perform_element_loop(&mesh).unwrap();
        assert!((dt - 1.0 / 2f64.sqrt()).abs() < 1e-14);

        engine.set_max_time_step(0.1);
        assert_eq!(engine.perform_element_loop(&mesh).unwrap(), 0.1);
    }

    #[test]
    fn test_uninitialized_rejected() {
        let mesh = RectMeshGenerator::new(1, 1, 1.0, 1.0).build().unwrap();
        let mut engine = TimeDependentApproximation::new(CountingModel, EngineConfig::default());
        assert!(matches!(
            engine.set_boundary_conditions(&mesh, 0.0),
            Err(PhysicsError::NotInitialized { .. })
        ));
        assert!(matches!(
            engine.perform_element_loop(&mesh),
            Err(PhysicsError::NotInitialized { .. })
        ));
    }

    #[test]
    fn test_double_initialization_rejected() {
        let mut mesh = RectMeshGenerator::new(1, 1, 1.0, 1.0).build().unwrap();
        let mut engine = TimeDependentApproximation::new(CountingModel, EngineConfig::default());
        engine.initial_dofs(&mut mesh).unwrap();
        assert!(matches!(
            engine.initial_dofs(&mut mesh),
            Err(PhysicsError::AlreadyInitialized { .. })
        ));
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_boundary_conditions() {
        let mut mesh = RectMeshGenerator::new(2, 1, 2.0, 1.0).build().unwrap();
        let mut engine = TimeDependentApproximation::new(CountingModel, EngineConfig::deterministic());
        engine.initialize(&mut mesh).unwrap();
        engine.set_boundary_conditions(&mesh, 3.5).unwrap();
        let records = engine.node_records(&mesh).unwrap();
        for (node, record) in mesh.nodes().iter().zip(&records) {
            let expected = if node.xy().x == 0.0 { 3.5 } else { 0.0 };
            assert_eq!(*record.read(), expected);
        }
    }
}
