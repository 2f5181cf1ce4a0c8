// crates/cf_mesh/src/geometry/edge.rs

//! 线性两节点线单元
//!
//! 用于一维子网格（河道、排水管线等）。形函数沿单元局部坐标 `s ∈ [0, L]`：
//! `N_0 = 1 - s/L`，`N_1 = s/L`，系数矩阵第 i 行为 `[常数项, s 的系数]`。

use cf_foundation::NodeIndex;
use glam::DVec2;

use super::bounds::BoundingBox;
use super::{snap_unit, ElementGeometry, ElementKind, NaturalCoordinates, CONTAINMENT_EPS};
use crate::error::{MeshError, MeshResult};

/// 最小长度，不超过该值视为退化
const MIN_LENGTH: f64 = 1e-12;

/// 线单元
#[derive(Debug, Clone)]
pub struct EdgeElement {
    nodes: [NodeIndex; 2],
    vertices: [DVec2; 2],
    length: f64,
    /// 单位切向量（节点 0 指向节点 1）
    tangent: DVec2,
    coefficients: [[f64; 2]; 2],
    bbox: BoundingBox,
}

impl EdgeElement {
    /// 由两个节点及其平面坐标构造
    pub fn new(nodes: [NodeIndex; 2], vertices: [DVec2; 2]) -> MeshResult<Self> {
        let d = vertices[1] - vertices[0];
        let length = d.length();
        if !(length > MIN_LENGTH) || !length.is_finite() {
            return Err(MeshError::degenerate(
                "edge",
                nodes.iter().map(|n| n.as_usize()).collect(),
                "length",
                length,
            ));
        }

        let inv = 1.0 / length;
        Ok(Self {
            nodes,
            vertices,
            length,
            tangent: d * inv,
            coefficients: [[1.0, -inv], [0.0, inv]],
            bbox: BoundingBox::from_points(vertices),
        })
    }

    /// 形函数系数
    #[inline]
    pub fn coefficients(&self) -> &[[f64; 2]; 2] {
        &self.coefficients
    }

    /// 单位切向量
    #[inline]
    pub fn tangent(&self) -> DVec2 {
        self.tangent
    }

    /// 点在单元直线上的投影参数 `t`（0 对应节点 0，1 对应节点 1）与到直线的距离
    fn project(&self, p: DVec2) -> (f64, f64) {
        let r = p - self.vertices[0];
        let t = r.dot(self.tangent) / self.length;
        let dist = self.tangent.perp_dot(r).abs();
        (t, dist)
    }
}

impl ElementGeometry for EdgeElement {
    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    fn volume(&self) -> f64 {
        self.length
    }

    fn elm_size(&self) -> f64 {
        self.length
    }

    fn max_edge_length(&self) -> f64 {
        self.length
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    fn contains_point(&self, p: DVec2) -> bool {
        let (t, dist) = self.project(p);
        dist <= CONTAINMENT_EPS * self.length
            && t >= -CONTAINMENT_EPS
            && t <= 1.0 + CONTAINMENT_EPS
    }

    fn natural_coordinates(&self, p: DVec2) -> Option<NaturalCoordinates> {
        if !self.contains_point(p) {
            return None;
        }
        let (t, _) = self.project(p);
        Some(NaturalCoordinates::edge([snap_unit(1.0 - t), snap_unit(t)]))
    }

    fn shape_gradient(&self, local: usize) -> DVec2 {
        self.tangent * self.coefficients[local][1]
    }

    fn incident_edge_lengths(&self, _local: usize) -> ([f64; 2], usize) {
        ([self.length, 0.0], 1)
    }
}
