// crates/cf_mesh/src/geometry/mod.rs

//! 几何单元
//!
//! - [`Node`]: 节点（坐标、相邻单元、模型数据）
//! - [`Triangle`]: 线性三角形
//! - [`EdgeElement`]: 两节点线单元
//! - [`Element`]: 网格中保存的单元，形状加模型数据
//!
//! 所有形状通过 [`ElementGeometry`] 提供统一的几何查询接口。

pub mod bounds;
pub mod edge;
pub mod node;
pub mod triangle;

use std::any::Any;

use cf_foundation::NodeIndex;
use glam::DVec2;
use serde::{Deserialize, Serialize};

pub use bounds::{BoundingBox, BoundingBox3d};
pub use edge::EdgeElement;
pub use node::Node;
pub use triangle::Triangle;

use crate::error::MeshResult;
use crate::model_data::{ModelDataKey, ModelDataSet, ModelDataView, ModelRecord};

/// 包含判断与自然坐标截断使用的相对容差
pub const CONTAINMENT_EPS: f64 = 1e-7;

/// 将接近 0 或 1 的自然坐标截断为精确值
#[inline]
pub(crate) fn snap_unit(value: f64) -> f64 {
    if value.abs() < CONTAINMENT_EPS {
        0.0
    } else if (value - 1.0).abs() < CONTAINMENT_EPS {
        1.0
    } else {
        value
    }
}

/// 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// 线性三角形
    Triangle,
    /// 两节点线单元
    Edge,
}

impl ElementKind {
    /// 节点数
    pub const fn n_nodes(self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Edge => 2,
        }
    }

    /// 名称
    pub const fn name(self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::Edge => "edge",
        }
    }
}

/// 自然坐标（最多三个分量，和为 1）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalCoordinates {
    values: [f64; 3],
    len: u8,
}

impl NaturalCoordinates {
    pub(crate) fn triangle(values: [f64; 3]) -> Self {
        Self { values, len: 3 }
    }

    pub(crate) fn edge(values: [f64; 2]) -> Self {
        Self {
            values: [values[0], values[1], 0.0],
            len: 2,
        }
    }

    /// 分量
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len as usize]
    }

    /// 用节点值插值
    pub fn interpolate(&self, nodal: &[f64]) -> f64 {
        self.as_slice().iter().zip(nodal).map(|(w, v)| w * v).sum()
    }
}

/// 单元几何查询接口
pub trait ElementGeometry {
    /// 单元类型
    fn kind(&self) -> ElementKind;

    /// 节点（局部顺序）
    fn nodes(&self) -> &[NodeIndex];

    /// 构造时缓存的顶点平面坐标
    fn vertices(&self) -> &[DVec2];

    /// 体积度量：三角形为面积，线单元为长度
    fn volume(&self) -> f64;

    /// 特征尺寸，用于 CFL 类时间步估计：三角形为最小高，线单元为长度
    fn elm_size(&self) -> f64;

    /// 最长边
    fn max_edge_length(&self) -> f64;

    /// 包围盒
    fn bounding_box(&self) -> BoundingBox;

    /// 点是否在单元内（含边界，带相对容差）
    fn contains_point(&self, p: DVec2) -> bool;

    /// 点的自然坐标；点不在单元内时为 `None`
    fn natural_coordinates(&self, p: DVec2) -> Option<NaturalCoordinates>;

    /// 第 `local` 个形函数的平面梯度
    fn shape_gradient(&self, local: usize) -> DVec2;

    /// 与第 `local` 个节点相连的边长及其个数
    fn incident_edge_lengths(&self, local: usize) -> ([f64; 2], usize);

    /// 节点数
    fn n_nodes(&self) -> usize {
        self.nodes().len()
    }
}

/// 单元形状
#[derive(Debug, Clone)]
pub enum Shape {
    /// 三角形
    Triangle(Triangle),
    /// 线单元
    Edge(EdgeElement),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Triangle($s) => $body,
            Shape::Edge($s) => $body,
        }
    };
}

impl ElementGeometry for Shape {
    fn kind(&self) -> ElementKind {
        dispatch!(self, s => s.kind())
    }
    fn nodes(&self) -> &[NodeIndex] {
        dispatch!(self, s => s.nodes())
    }
    fn vertices(&self) -> &[DVec2] {
        dispatch!(self, s => s.vertices())
    }
    fn volume(&self) -> f64 {
        dispatch!(self, s => s.volume())
    }
    fn elm_size(&self) -> f64 {
        dispatch!(self, s => s.elm_size())
    }
    fn max_edge_length(&self) -> f64 {
        dispatch!(self, s => s.max_edge_length())
    }
    fn bounding_box(&self) -> BoundingBox {
        dispatch!(self, s => s.bounding_box())
    }
    fn contains_point(&self, p: DVec2) -> bool {
        dispatch!(self, s => s.contains_point(p))
    }
    fn natural_coordinates(&self, p: DVec2) -> Option<NaturalCoordinates> {
        dispatch!(self, s => s.natural_coordinates(p))
    }
    fn shape_gradient(&self, local: usize) -> DVec2 {
        dispatch!(self, s => s.shape_gradient(local))
    }
    fn incident_edge_lengths(&self, local: usize) -> ([f64; 2], usize) {
        dispatch!(self, s => s.incident_edge_lengths(local))
    }
}

/// 网格单元：形状加模型数据
#[derive(Debug)]
pub struct Element {
    shape: Shape,
    model_data: ModelDataSet,
}

impl Element {
    /// 三角形单元
    pub fn triangle(nodes: [NodeIndex; 3], vertices: [DVec2; 3]) -> MeshResult<Self> {
        Ok(Self::from_shape(Shape::Triangle(Triangle::new(nodes, vertices)?)))
    }

    /// 线单元
    pub fn edge(nodes: [NodeIndex; 2], vertices: [DVec2; 2]) -> MeshResult<Self> {
        Ok(Self::from_shape(Shape::Edge(EdgeElement::new(nodes, vertices)?)))
    }

    /// 由已构造的形状创建
    pub fn from_shape(shape: Shape) -> Self {
        Self {
            shape,
            model_data: ModelDataSet::new(),
        }
    }

    /// 形状
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// 作为三角形
    pub fn as_triangle(&self) -> Option<&Triangle> {
        match &self.shape {
            Shape::Triangle(t) => Some(t),
            Shape::Edge(_) => None,
        }
    }

    /// 作为线单元
    pub fn as_edge(&self) -> Option<&EdgeElement> {
        match &self.shape {
            Shape::Edge(e) => Some(e),
            Shape::Triangle(_) => None,
        }
    }

    /// 局部节点 `local` 的全局编号
    #[inline]
    pub fn node(&self, local: usize) -> NodeIndex {
        self.shape.nodes()[local]
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

impl ElementGeometry for Element {
    fn kind(&self) -> ElementKind {
        self.shape.kind()
    }
    fn nodes(&self) -> &[NodeIndex] {
        self.shape.nodes()
    }
    fn vertices(&self) -> &[DVec2] {
        self.shape.vertices()
    }
    fn volume(&self) -> f64 {
        self.shape.volume()
    }
    fn elm_size(&self) -> f64 {
        self.shape.elm_size()
    }
    fn max_edge_length(&self) -> f64 {
        self.shape.max_edge_length()
    }
    fn bounding_box(&self) -> BoundingBox {
        self.shape.bounding_box()
    }
    fn contains_point(&self, p: DVec2) -> bool {
        self.shape.contains_point(p)
    }
    fn natural_coordinates(&self, p: DVec2) -> Option<NaturalCoordinates> {
        self.shape.natural_coordinates(p)
    }
    fn shape_gradient(&self, local: usize) -> DVec2 {
        self.shape.shape_gradient(local)
    }
    fn incident_edge_lengths(&self, local: usize) -> ([f64; 2], usize) {
        self.shape.incident_edge_lengths(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_foundation::index::node;

    #[test]
    fn test_snap_unit() {
        assert_eq!(snap_unit(1e-9), 0.0);
        assert_eq!(snap_unit(1.0 - 1e-9), 1.0);
        assert_eq!(snap_unit(0.3), 0.3);
    }

    #[test]
    fn test_element_dispatch() {
        let tri = Element::triangle(
            [node(0), node(1), node(2)],
            [DVec2::ZERO, DVec2::new(2.0, 0.0), DVec2::new(0.0, 2.0)],
        )
        .unwrap();
        assert_eq!(tri.kind(), ElementKind::Triangle);
        assert_eq!(tri.n_nodes(), 3);
        assert!((tri.volume() - 2.0).abs() < 1e-14);
        assert!(tri.as_triangle().is_some());
        assert!(tri.as_edge().is_none());

        let edge = Element::edge([node(3), node(4)], [DVec2::ZERO, DVec2::new(0.0, 4.0)]).unwrap();
        assert_eq!(edge.kind(), ElementKind::Edge);
        assert_eq!(edge.node(1), node(4));
        assert_eq!(edge.elm_size(), 4.0);
    }

    #[test]
    fn test_interpolate() {
        let nc = NaturalCoordinates::triangle([0.2, 0.3, 0.5]);
        assert!((nc.interpolate(&[1.0, 2.0, 3.0]) - 2.3).abs() < 1e-14);
    }
}
