// crates/cf_mesh/src/geometry/node.rs

//! 网格节点
//!
//! 节点保存三维坐标、相邻单元列表与模型数据。
//! 相邻单元列表只由网格分解在加入单元时维护，同时累积集中质量和平均邻边长度。

use std::any::Any;

use cf_foundation::{ElementIndex, NodeIndex};
use glam::{DVec2, DVec3};

use crate::model_data::{ModelDataKey, ModelDataSet, ModelDataView, ModelRecord};

/// 网格节点
#[derive(Debug)]
pub struct Node {
    id: NodeIndex,
    position: DVec3,
    elements: Vec<ElementIndex>,
    lumped_mass: f64,
    edge_length_sum: f64,
    edge_count: u32,
    model_data: ModelDataSet,
}

impl Node {
    pub(crate) fn new(id: NodeIndex, position: DVec3) -> Self {
        Self {
            id,
            position,
            elements: Vec::new(),
            lumped_mass: 0.0,
            edge_length_sum: 0.0,
            edge_count: 0,
            model_data: ModelDataSet::new(),
        }
    }

    /// 节点编号（创建顺序）
    #[inline]
    pub fn id(&self) -> NodeIndex {
        self.id
    }

    /// 三维坐标
    #[inline]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// 平面坐标
    #[inline]
    pub fn xy(&self) -> DVec2 {
        self.position.truncate()
    }

    /// 高程 (z)
    #[inline]
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// 修改坐标
    ///
    /// 已构造单元缓存的几何量不会随之更新，点定位树也需要重建。
    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    /// 相邻单元（加入顺序）
    #[inline]
    pub fn elements(&self) -> &[ElementIndex] {
        &self.elements
    }

    /// 集中质量：各相邻单元体积均分到节点后的和
    #[inline]
    pub fn lumped_mass(&self) -> f64 {
        self.lumped_mass
    }

    /// 相邻边的平均长度，孤立节点为 0
    pub fn mean_edge_length(&self) -> f64 {
        if self.edge_count == 0 {
            0.0
        } else {
            self.edge_length_sum / self.edge_count as f64
        }
    }

    pub(crate) fn register_element(
        &mut self,
        element: ElementIndex,
        mass_share: f64,
        edge_lengths: &[f64],
    ) {
        self.elements.push(element);
        self.lumped_mass += mass_share;
        self.edge_length_sum += edge_lengths.iter().sum::<f64>();
        self.edge_count += edge_lengths.len() as u32;
    }

    /// 追加模型数据记录
    pub fn add_model_data<T: Any + Send + Sync>(&mut self, value: T) -> ModelDataKey<T> {
        self.model_data.push(value)
    }

    /// 全部模型数据的只读视图
    pub fn all_model_data(&self) -> ModelDataView<'_> {
        self.model_data.view()
    }

    /// 按位置取模型数据
    pub fn model_data_at(&self, index: usize) -> Option<&ModelRecord> {
        self.model_data.at(index)
    }

    /// 按身份查找记录位置
    pub fn index_of<R: ?Sized>(&self, record: &R) -> Option<usize> {
        self.model_data.index_of(record)
    }

    /// 模型数据集合
    #[inline]
    pub fn model_data(&self) -> &ModelDataSet {
        &self.model_data
    }

    /// 模型数据集合（可变）
    #[inline]
    pub fn model_data_mut(&mut self) -> &mut ModelDataSet {
        &mut self.model_data
    }
}
