// crates/cf_physics/src/fe_system.rs

//! 有限元近似到 ODE 系统的适配
//!
//! 状态向量按节点排列：节点 i 的自由度位于 `[i·k, (i+1)·k)`，k 为 `dofs_per_node`。
//! 一次 `rate_of_change` 依次执行：读入状态 → 边界条件 → 单元循环 → 节点变化率。
//! `constrain_state` 在读入状态并施加边界条件后，把模型给出的约束值写回状态向量。

use cf_mesh::Decomposition;
use rayon::prelude::*;

use crate::approximation::TimeDependentApproximation;
use crate::error::{PhysicsError, PhysicsResult};
use crate::model::PhysicsModel;
use crate::ode::OdeSystem;

/// 基于网格的 ODE 系统
pub struct FeOdeSystem<'m, M: PhysicsModel> {
    mesh: &'m Decomposition,
    approximation: TimeDependentApproximation<M>,
}

impl<'m, M: PhysicsModel> FeOdeSystem<'m, M> {
    /// 包装已初始化的引擎
    pub fn new(mesh: &'m Decomposition, approximation: TimeDependentApproximation<M>) -> PhysicsResult<Self> {
        if !approximation.is_ready() {
            return Err(PhysicsError::NotInitialized {
                operation: "FeOdeSystem::new",
                requires: "initialize",
            });
        }
        Ok(Self {
            mesh,
            approximation,
        })
    }

    /// 网格
    pub fn mesh(&self) -> &'m Decomposition {
        self.mesh
    }

    /// 近似引擎
    pub fn approximation(&self) -> &TimeDependentApproximation<M> {
        &self.approximation
    }

    /// 每节点自由度
    pub fn dofs_per_node(&self) -> usize {
        self.approximation.model().dofs_per_node()
    }

    /// 由节点数据组装初始状态向量
    pub fn initial_state(&self) -> PhysicsResult<Vec<f64>> {
        let k = self.dofs_per_node();
        let records = self.approximation.node_records(self.mesh)?;
        let model = self.approximation.model();
        let mut state = vec![0.0; self.mesh.n_nodes() * k];
        if k > 0 {
            for ((chunk, record), node) in state
                .chunks_mut(k)
                .zip(&records)
                .zip(self.mesh.nodes())
            {
                model.initial_state(node, &record.read(), chunk);
            }
        }
        Ok(state)
    }

    /// 把状态向量写回节点数据（不施加边界条件）
    pub fn load_state(&self, state: &[f64]) -> PhysicsResult<()> {
        let k = self.dofs_per_node();
        PhysicsError::check_size("state", self.dimension(), state.len())?;
        if k == 0 {
            return Ok(());
        }
        let records = self.approximation.node_records(self.mesh)?;
        let model = self.approximation.model();
        state
            .par_chunks(k)
            .zip(records.par_iter())
            .zip(self.mesh.nodes().par_iter())
            .for_each(|((chunk, record), node)| {
                model.load_state(node, &mut record.write(), chunk);
            });
        Ok(())
    }
}

impl<'m, M: PhysicsModel> OdeSystem for FeOdeSystem<'m, M> {
    fn dimension(&self) -> usize {
        self.mesh.n_nodes() * self.dofs_per_node()
    }

    fn rate_of_change(&mut self, time: f64, state: &[f64], rate: &mut [f64]) -> PhysicsResult<()> {
        let n = self.dimension();
        PhysicsError::check_size("rate", n, rate.len())?;
        self.load_state(state)?;
        self.approximation.set_boundary_conditions(self.mesh, time)?;
        self.approximation.perform_element_loop(self.mesh)?;

        let k = self.dofs_per_node();
        if k == 0 {
            return Ok(());
        }
        let records = self.approximation.node_records(self.mesh)?;
        let model = self.approximation.model();
        rate.par_chunks_mut(k)
            .zip(records.par_iter())
            .zip(self.mesh.nodes().par_iter())
            .for_each(|((chunk, record), node)| {
                model.rate_of_change(node, &record.read(), chunk);
            });
        Ok(())
    }

    fn constrain_state(&mut self, time: f64, state: &mut [f64]) -> PhysicsResult<()> {
        self.load_state(state)?;
        self.approximation.set_boundary_conditions(self.mesh, time)?;

        let k = self.dofs_per_node();
        if k == 0 {
            return Ok(());
        }
        let records = self.approximation.node_records(self.mesh)?;
        let model = self.approximation.model();
        state
            .par_chunks_mut(k)
            .zip(records.par_iter())
            .zip(self.mesh.nodes().par_iter())
            .for_each(|((chunk, record), node)| {
                model.constrained_state(node, &record.read(), chunk);
            });
        Ok(())
    }

    fn max_time_step(&self) -> f64 {
        self.approximation.max_time_step()
    }

    fn set_max_time_step(&mut self, dt: f64) {
        self.approximation.set_max_time_step(dt);
    }
}
