// crates/cf_mesh/src/geometry/triangle.rs

//! 线性三角形单元
//!
//! 构造时缓存顶点坐标、面积、边长与形函数系数，之后的几何查询不再访问节点。
//! 节点坐标在构造后被修改时，缓存不会自动更新。
//!
//! 形函数 `N_i(x, y) = a_i + b_i·x + c_i·y`，其中 (i, j, k) 为循环排列：
//!
//! ```text
//! a_i = (x_j·y_k - x_k·y_j) / 2A
//! b_i = (y_j - y_k) / 2A
//! c_i = (x_k - x_j) / 2A
//! ```

use cf_foundation::NodeIndex;
use glam::DVec2;

use super::bounds::BoundingBox;
use super::{snap_unit, ElementGeometry, ElementKind, NaturalCoordinates, CONTAINMENT_EPS};
use crate::error::{MeshError, MeshResult};

/// 面积相对阈值：`2A <= REL_AREA_TOL · max_edge²` 视为退化
const REL_AREA_TOL: f64 = 1e-12;

/// 线性三角形
#[derive(Debug, Clone)]
pub struct Triangle {
    nodes: [NodeIndex; 3],
    vertices: [DVec2; 3],
    area: f64,
    /// `edge_lengths[i]` 为顶点 i 的对边长度
    edge_lengths: [f64; 3],
    max_edge: f64,
    min_height: f64,
    /// 第 i 行为 `[a_i, b_i, c_i]`
    coefficients: [[f64; 3]; 3],
    bbox: BoundingBox,
}

impl Triangle {
    /// 由三个节点及其平面坐标构造
    ///
    /// 顶点必须逆时针排列；顺时针、共线或面积接近零时返回 `DegenerateElement`。
    pub fn new(nodes: [NodeIndex; 3], vertices: [DVec2; 3]) -> MeshResult<Self> {
        let [p0, p1, p2] = vertices;
        let double_area = (p1 - p0).perp_dot(p2 - p0);

        let edge_lengths = [
            p1.distance(p2),
            p2.distance(p0),
            p0.distance(p1),
        ];
        let max_edge = edge_lengths[0].max(edge_lengths[1]).max(edge_lengths[2]);

        if !(double_area > REL_AREA_TOL * max_edge * max_edge) || !double_area.is_finite() {
            return Err(MeshError::degenerate(
                "triangle",
                nodes.iter().map(|n| n.as_usize()).collect(),
                "signed_area",
                0.5 * double_area,
            ));
        }

        let mut coefficients = [[0.0; 3]; 3];
        for i in 0..3 {
            let pj = vertices[(i + 1) % 3];
            let pk = vertices[(i + 2) % 3];
            coefficients[i] = [
                (pj.x * pk.y - pk.x * pj.y) / double_area,
                (pj.y - pk.y) / double_area,
                (pk.x - pj.x) / double_area,
            ];
        }

        Ok(Self {
            nodes,
            vertices,
            area: 0.5 * double_area,
            edge_lengths,
            max_edge,
            min_height: double_area / max_edge,
            coefficients,
            bbox: BoundingBox::from_points(vertices),
        })
    }

    /// 形函数系数 `[a_i, b_i, c_i]`
    #[inline]
    pub fn coefficients(&self) -> &[[f64; 3]; 3] {
        &self.coefficients
    }

    /// 顶点 i 的对边长度
    #[inline]
    pub fn edge_lengths(&self) -> [f64; 3] {
        self.edge_lengths
    }

    /// 最小高（2A / 最长边）
    #[inline]
    pub fn min_height(&self) -> f64 {
        self.min_height
    }

    /// 形心
    pub fn centroid(&self) -> DVec2 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }

    /// 未截断的面积坐标（可能为负）
    pub fn barycentric(&self, p: DVec2) -> [f64; 3] {
        let mut lambda = [0.0; 3];
        for (l, [a, b, c]) in lambda.iter_mut().zip(self.coefficients.iter()) {
            *l = a + b * p.x + c * p.y;
        }
        lambda
    }
}

impl ElementGeometry for Triangle {
    fn kind(&self) -> ElementKind {
        ElementKind::Triangle
    }

    fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    fn volume(&self) -> f64 {
        self.area
    }

    fn elm_size(&self) -> f64 {
        self.min_height
    }

    fn max_edge_length(&self) -> f64 {
        self.max_edge
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    fn contains_point(&self, p: DVec2) -> bool {
        if !self.bbox.contains(p) {
            return false;
        }
        self.barycentric(p).iter().all(|&l| l >= -CONTAINMENT_EPS)
    }

    fn natural_coordinates(&self, p: DVec2) -> Option<NaturalCoordinates> {
        if !self.contains_point(p) {
            return None;
        }
        let lambda = self.barycentric(p).map(snap_unit);
        Some(NaturalCoordinates::triangle(lambda))
    }

    fn shape_gradient(&self, local: usize) -> DVec2 {
        let [_, b, c] = self.coefficients[local];
        DVec2::new(b, c)
    }

    fn incident_edge_lengths(&self, local: usize) -> ([f64; 2], usize) {
        (
            [
                self.edge_lengths[(local + 1) % 3],
                self.edge_lengths[(local + 2) % 3],
            ],
            2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_foundation::index::node;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            [node(0), node(1), node(2)],
            [DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_unit_triangle_metrics() {
        let t = unit_triangle();
        assert!((t.volume() - 0.5).abs() < 1e-14);
        assert!((t.max_edge_length() - 2f64.sqrt()).abs() < 1e-14);
        // 最小高 = 2A / 最长边 = 1/√2
        assert!((t.elm_size() - 1.0 / 2f64.sqrt()).abs() < 1e-14);
    }

    #[test]
    fn test_shape_functions_partition_unity() {
        let t = Triangle::new(
            [node(0), node(1), node(2)],
            [DVec2::new(1.0, 1.0), DVec2::new(4.0, 2.0), DVec2::new(2.0, 5.0)],
        )
        .unwrap();

        // 在各自顶点为 1，其余顶点为 0
        for (i, v) in t.vertices().iter().enumerate() {
            let lambda = t.barycentric(*v);
            for (j, l) in lambda.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((l - expected).abs() < 1e-12);
            }
        }

        let sum_b: f64 = t.coefficients().iter().map(|r| r[1]).sum();
        let sum_c: f64 = t.coefficients().iter().map(|r| r[2]).sum();
        assert!(sum_b.abs() < 1e-12);
        assert!(sum_c.abs() < 1e-12);
    }

    #[test]
    fn test_contains_and_natural_coordinates() {
        let t = unit_triangle();
        let nc = t.natural_coordinates(DVec2::new(0.25, 0.25)).unwrap();
        let w = nc.as_slice();
        assert!((w[0] - 0.5).abs() < 1e-12);
        assert!((w[1] - 0.25).abs() < 1e-12);
        assert!((w[2] - 0.25).abs() < 1e-12);

        assert!(t.contains_point(DVec2::new(0.5, 0.5)));
        assert!(!t.contains_point(DVec2::new(0.6, 0.6)));
        assert!(t.natural_coordinates(DVec2::new(-0.1, 0.2)).is_none());
    }

    #[test]
    fn test_vertex_snaps_to_unit() {
        let t = unit_triangle();
        let nc = t.natural_coordinates(DVec2::new(1.0, 0.0)).unwrap();
        assert_eq!(nc.as_slice(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_degenerate_rejected() {
        let collinear = Triangle::new(
            [node(0), node(1), node(2)],
            [DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0)],
        );
        assert!(matches!(collinear, Err(MeshError::DegenerateElement { .. })));

        let clockwise = Triangle::new(
            [node(0), node(1), node(2)],
            [DVec2::new(0.0, 0.0), DVec2::new(0.0, 1.0), DVec2::new(1.0, 0.0)],
        );
        assert!(clockwise.is_err());
    }

    #[test]
    fn test_gradient_matches_coefficients() {
        let t = unit_triangle();
        assert_eq!(t.shape_gradient(0), DVec2::new(-1.0, -1.0));
        assert_eq!(t.shape_gradient(1), DVec2::new(1.0, 0.0));
        assert_eq!(t.shape_gradient(2), DVec2::new(0.0, 1.0));
    }
}
