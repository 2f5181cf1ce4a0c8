// crates/cf_mesh/src/io.rs

//! 网格快照
//!
//! 只保存几何与拓扑（节点坐标、单元类型与节点序列），不保存模型数据与点定位树。
//! 以 JSON 格式读写。

use std::path::Path;

use cf_config::SpatialIndexConfig;
use cf_foundation::NodeIndex;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::decomposition::Decomposition;
use crate::error::{MeshError, MeshResult};
use crate::geometry::{ElementGeometry, ElementKind};

/// 单元记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// 单元类型
    pub kind: ElementKind,
    /// 节点编号
    pub nodes: Vec<u32>,
}

/// 网格快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    /// 节点坐标 [x, y, z]
    pub nodes: Vec<[f64; 3]>,
    /// 单元（按编号顺序）
    pub elements: Vec<ElementRecord>,
}

impl MeshSnapshot {
    /// 从网格提取快照
    pub fn capture(mesh: &Decomposition) -> Self {
        Self {
            nodes: mesh
                .nodes()
                .iter()
                .map(|n| n.position().to_array())
                .collect(),
            elements: mesh
                .elements()
                .iter()
                .map(|e| ElementRecord {
                    kind: e.kind(),
                    nodes: e.nodes().iter().map(|n| n.index()).collect(),
                })
                .collect(),
        }
    }

    /// 重建网格
    ///
    /// 节点与单元按快照顺序加入，编号与捕获时一致（重复单元除外）。
    pub fn restore(&self, index_config: SpatialIndexConfig) -> MeshResult<Decomposition> {
        let mut mesh = Decomposition::with_index_config(index_config);
        for p in &self.nodes {
            mesh.add_node(DVec3::from_array(*p));
        }
        for record in &self.elements {
            if record.nodes.len() != record.kind.n_nodes() {
                return Err(MeshError::NodeCountMismatch {
                    kind: record.kind.name(),
                    required: record.kind.n_nodes(),
                    provided: record.nodes.len(),
                });
            }
            if let Some(&bad) = record.nodes.iter().find(|&&n| n as usize >= mesh.n_nodes()) {
                return Err(MeshError::UnknownNode {
                    node: bad as usize,
                    n_nodes: mesh.n_nodes(),
                });
            }
            let nodes: Vec<NodeIndex> = record.nodes.iter().map(|&n| NodeIndex::new(n)).collect();
            mesh.add_element_nodes(&nodes)?;
        }
        Ok(mesh)
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> MeshResult<String> {
        serde_json::to_string(self).map_err(|e| MeshError::Snapshot(e.to_string()))
    }

    /// 从 JSON 字符串解析
    pub fn from_json(content: &str) -> MeshResult<Self> {
        serde_json::from_str(content).map_err(|e| MeshError::Snapshot(e.to_string()))
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> MeshResult<()> {
        let content = self.to_json()?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| MeshError::Snapshot(format!("{}: {}", path.as_ref().display(), e)))
    }

    /// 从文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> MeshResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MeshError::Snapshot(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{PolylineMeshGenerator, RectMeshGenerator};

    #[test]
    fn test_capture_restore_preserves_topology() {
        let mut mesh = RectMeshGenerator::new(3, 2, 3.0, 2.0).build().unwrap();
        PolylineMeshGenerator::new(vec![(0.0, 3.0), (3.0, 3.0)], 3)
            .append_to(&mut mesh)
            .unwrap();

        let snapshot = MeshSnapshot::capture(&mesh);
        let json = snapshot.to_json().unwrap();
        let restored = MeshSnapshot::from_json(&json)
            .unwrap()
            .restore(SpatialIndexConfig::default())
            .unwrap();

        assert_eq!(restored.n_nodes(), mesh.n_nodes());
        assert_eq!(restored.n_elements(), mesh.n_elements());
        for (a, b) in mesh.elements().iter().zip(restored.elements()) {
            assert_eq!(a.nodes(), b.nodes());
            assert_eq!(a.kind(), b.kind());
        }
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn test_bad_record_rejected() {
        let snapshot = MeshSnapshot {
            nodes: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            elements: vec![ElementRecord {
                kind: ElementKind::Triangle,
                nodes: vec![0, 1],
            }],
        };
        assert!(matches!(
            snapshot.restore(SpatialIndexConfig::default()),
            Err(MeshError::NodeCountMismatch { required: 3, provided: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(MeshSnapshot::from_json("[1, 2"), Err(MeshError::Snapshot(_))));
    }
}
