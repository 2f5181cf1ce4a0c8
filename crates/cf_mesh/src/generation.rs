// crates/cf_mesh/src/generation.rs

//! 结构化网格生成器
//!
//! 用于测试和示例的简单网格：矩形域三角网格与折线线单元网格。

use cf_config::SpatialIndexConfig;
use cf_foundation::NodeIndex;

use crate::decomposition::Decomposition;
use crate::error::{MeshError, MeshResult};

/// 矩形网格生成器
///
/// 生成 nx × ny 个矩形，每个矩形分为 2 个逆时针三角形，对角线方向交替。
#[derive(Debug, Clone)]
pub struct RectMeshGenerator {
    nx: usize,
    ny: usize,
    lx: f64,
    ly: f64,
    x0: f64,
    y0: f64,
    index_config: SpatialIndexConfig,
}

impl RectMeshGenerator {
    /// 创建矩形网格生成器
    ///
    /// # 参数
    ///
    /// - `nx`, `ny`: x / y 方向的分割数
    /// - `lx`, `ly`: 域的宽度和高度
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> Self {
        Self {
            nx,
            ny,
            lx,
            ly,
            x0: 0.0,
            y0: 0.0,
            index_config: SpatialIndexConfig::default(),
        }
    }

    /// 正方形网格
    pub fn square(n: usize, length: f64) -> Self {
        Self::new(n, n, length, length)
    }

    /// 设置原点
    pub fn with_origin(mut self, x0: f64, y0: f64) -> Self {
        self.x0 = x0;
        self.y0 = y0;
        self
    }

    /// 设置生成网格的点定位树配置
    pub fn with_index_config(mut self, config: SpatialIndexConfig) -> Self {
        self.index_config = config;
        self
    }

    /// x 方向网格间距
    pub fn dx(&self) -> f64 {
        self.lx / self.nx as f64
    }

    /// y 方向网格间距
    pub fn dy(&self) -> f64 {
        self.ly / self.ny as f64
    }

    /// 节点总数
    pub fn n_nodes(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    /// 单元总数
    pub fn n_elements(&self) -> usize {
        self.nx * self.ny * 2
    }

    /// 网格点 (i, j) 的节点编号
    pub fn node_at(&self, i: usize, j: usize) -> NodeIndex {
        NodeIndex::from_usize(j * (self.nx + 1) + i)
    }

    /// 节点是否在矩形边界上
    pub fn is_boundary(&self, node: NodeIndex) -> bool {
        let k = node.as_usize();
        let i = k % (self.nx + 1);
        let j = k / (self.nx + 1);
        i == 0 || j == 0 || i == self.nx || j == self.ny
    }

    /// 构建网格（高程为 0）
    pub fn build(&self) -> MeshResult<Decomposition> {
        self.build_with_elevation(|_, _| 0.0)
    }

    /// 构建带节点高程的网格
    ///
    /// - `elevation`: 返回给定 (x, y) 处高程的函数
    pub fn build_with_elevation<F>(&self, elevation: F) -> MeshResult<Decomposition>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.nx == 0 || self.ny == 0 {
            return Err(MeshError::invalid_topology(
                "rect_mesh",
                format!("分割数必须为正: nx={}, ny={}", self.nx, self.ny),
            ));
        }

        let mut mesh = Decomposition::with_index_config(self.index_config.clone());
        let dx = self.dx();
        let dy = self.dy();

        for j in 0..=self.ny {
            for i in 0..=self.nx {
                let x = self.x0 + i as f64 * dx;
                let y = self.y0 + j as f64 * dy;
                mesh.add_node_xyz(x, y, elevation(x, y));
            }
        }

        for j in 0..self.ny {
            for i in 0..self.nx {
                let v00 = self.node_at(i, j);
                let v10 = self.node_at(i + 1, j);
                let v01 = self.node_at(i, j + 1);
                let v11 = self.node_at(i + 1, j + 1);

                // 交替对角线方向，避免各向异性
                if (i + j) % 2 == 0 {
                    mesh.add_triangle([v00, v10, v11])?;
                    mesh.add_triangle([v00, v11, v01])?;
                } else {
                    mesh.add_triangle([v00, v10, v01])?;
                    mesh.add_triangle([v10, v11, v01])?;
                }
            }
        }

        log::debug!(
            "矩形网格: {}x{} 分割, {} 节点, {} 单元",
            self.nx,
            self.ny,
            mesh.n_nodes(),
            mesh.n_elements()
        );
        Ok(mesh)
    }
}

/// 折线网格生成器
///
/// 沿给定折点依次连接线单元，每段再等分为 `segments_per_leg` 个单元。
#[derive(Debug, Clone)]
pub struct PolylineMeshGenerator {
    points: Vec<(f64, f64)>,
    segments_per_leg: usize,
}

impl PolylineMeshGenerator {
    /// 创建折线网格生成器
    pub fn new(points: Vec<(f64, f64)>, segments_per_leg: usize) -> Self {
        Self {
            points,
            segments_per_leg,
        }
    }

    /// 节点数
    pub fn n_nodes(&self) -> usize {
        match self.points.len() {
            0 => 0,
            n => (n - 1) * self.segments_per_leg + 1,
        }
    }

    /// 在已有网格中追加折线，返回按顺序排列的新节点
    pub fn append_to(&self, mesh: &mut Decomposition) -> MeshResult<Vec<NodeIndex>> {
        if self.points.len() < 2 || self.segments_per_leg == 0 {
            return Err(MeshError::invalid_topology(
                "polyline_mesh",
                format!(
                    "至少需要 2 个折点和 1 段分割, 实际 {} 个折点, {} 段",
                    self.points.len(),
                    self.segments_per_leg
                ),
            ));
        }

        let mut chain = Vec::with_capacity(self.n_nodes());
        let (x, y) = self.points[0];
        chain.push(mesh.add_node_xyz(x, y, 0.0));

        for leg in self.points.windows(2) {
            let (xa, ya) = leg[0];
            let (xb, yb) = leg[1];
            for s in 1..=self.segments_per_leg {
                let t = s as f64 / self.segments_per_leg as f64;
                let next = mesh.add_node_xyz(xa + t * (xb - xa), ya + t * (yb - ya), 0.0);
                let prev = chain[chain.len() - 1];
                mesh.add_edge([prev, next])?;
                chain.push(next);
            }
        }
        Ok(chain)
    }

    /// 构建只含该折线的网格
    pub fn build(&self) -> MeshResult<Decomposition> {
        let mut mesh = Decomposition::new();
        self.append_to(&mut mesh)?;
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ElementGeometry;

    #[test]
    fn test_rect_mesh_basic() {
        let mesh = RectMeshGenerator::new(2, 2, 10.0, 10.0).build().unwrap();
        // 2x2 矩形 -> 8 个三角形, 3x3 节点
        assert_eq!(mesh.n_elements(), 8);
        assert_eq!(mesh.n_nodes(), 9);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_rect_mesh_area() {
        let gen = RectMeshGenerator::new(5, 3, 10.0, 6.0).with_origin(-5.0, 1.0);
        let mesh = gen.build().unwrap();
        let area: f64 = mesh.elements().iter().map(|e| e.volume()).sum();
        assert!((area - 60.0).abs() < 1e-10);
        let bb = mesh.bounds();
        assert_eq!((bb.min_x, bb.max_x), (-5.0, 5.0));
        assert_eq!((bb.min_y, bb.max_y), (1.0, 7.0));
    }

    #[test]
    fn test_boundary_nodes() {
        let gen = RectMeshGenerator::square(4, 1.0);
        let n_boundary = (0..gen.n_nodes())
            .filter(|&k| gen.is_boundary(NodeIndex::from_usize(k)))
            .count();
        assert_eq!(n_boundary, 16);
        assert!(!gen.is_boundary(gen.node_at(2, 2)));
    }

    #[test]
    fn test_elevation() {
        let mesh = RectMeshGenerator::new(2, 1, 2.0, 1.0)
            .build_with_elevation(|x, _| -x)
            .unwrap();
        let bb = mesh.bounding_box_3d();
        assert_eq!(bb.min.z, -2.0);
        assert_eq!(bb.max.z, 0.0);
    }

    #[test]
    fn test_zero_divisions_rejected() {
        assert!(RectMeshGenerator::new(0, 3, 1.0, 1.0).build().is_err());
    }

    #[test]
    fn test_polyline() {
        let gen = PolylineMeshGenerator::new(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 5.0)], 5);
        let mesh = gen.build().unwrap();
        assert_eq!(mesh.n_nodes(), gen.n_nodes());
        assert_eq!(mesh.n_elements(), 10);
        let length: f64 = mesh.elements().iter().map(|e| e.volume()).sum();
        assert!((length - 15.0).abs() < 1e-12);
    }
}
