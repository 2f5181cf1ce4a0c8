// crates/cf_mesh/src/decomposition.rs

//! 网格分解
//!
//! [`Decomposition`] 拥有全部节点和单元，编号即创建顺序。
//!
//! # 不变量
//!
//! - 单元 E 引用节点 N，当且仅当 E 出现在 N 的相邻单元列表中；
//! - 同类型、节点序列相同的单元只存一份，重复加入返回已有编号；
//! - 点定位树在第一次查询时惰性构建，之后加入的单元不会被索引，
//!   需要调用 [`Decomposition::rebuild_spatial_index`]。
//!
//! 节点和单元的模型数据可以在构建完成后继续追加，不影响拓扑和索引。

use std::collections::HashMap;
use std::sync::OnceLock;

use cf_config::SpatialIndexConfig;
use cf_foundation::{ElementIndex, NodeIndex};
use glam::{DVec2, DVec3};

use crate::coloring::ElementColoring;
use crate::error::{MeshError, MeshResult};
use crate::geometry::{
    BoundingBox, BoundingBox3d, Element, ElementGeometry, ElementKind, NaturalCoordinates, Node,
    CONTAINMENT_EPS,
};
use crate::spatial_tree::SpatialTree;

/// 单元去重键：类型 + 节点序列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ElementKey {
    kind: ElementKind,
    nodes: [u32; 3],
}

impl ElementKey {
    fn of(element: &Element) -> Self {
        let mut nodes = [u32::MAX; 3];
        for (slot, n) in nodes.iter_mut().zip(element.nodes()) {
            *slot = n.index();
        }
        Self {
            kind: element.kind(),
            nodes,
        }
    }
}

/// 点定位结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// 包含该点的单元
    pub element: ElementIndex,
    /// 点在该单元中的自然坐标
    pub coordinates: NaturalCoordinates,
}

/// 网格分解
#[derive(Debug, Default)]
pub struct Decomposition {
    nodes: Vec<Node>,
    elements: Vec<Element>,
    lookup: HashMap<ElementKey, ElementIndex>,
    index_config: SpatialIndexConfig,
    spatial_index: OnceLock<SpatialTree>,
}

impl Decomposition {
    /// 创建空网格
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定点定位树配置创建空网格
    pub fn with_index_config(index_config: SpatialIndexConfig) -> Self {
        Self {
            index_config,
            ..Default::default()
        }
    }

    /// 点定位树配置
    pub fn index_config(&self) -> &SpatialIndexConfig {
        &self.index_config
    }

    // =========================================================================
    // 构建
    // =========================================================================

    /// 加入节点
    pub fn add_node(&mut self, position: DVec3) -> NodeIndex {
        let id = NodeIndex::from_usize(self.nodes.len());
        self.nodes.push(Node::new(id, position));
        id
    }

    /// 按坐标分量加入节点
    pub fn add_node_xyz(&mut self, x: f64, y: f64, z: f64) -> NodeIndex {
        self.add_node(DVec3::new(x, y, z))
    }

    /// 由三个已有节点加入三角形（逆时针）
    pub fn add_triangle(&mut self, nodes: [NodeIndex; 3]) -> MeshResult<ElementIndex> {
        let vertices = [
            self.checked_node(nodes[0])?.xy(),
            self.checked_node(nodes[1])?.xy(),
            self.checked_node(nodes[2])?.xy(),
        ];
        self.add_element(Element::triangle(nodes, vertices)?)
    }

    /// 由两个已有节点加入线单元
    pub fn add_edge(&mut self, nodes: [NodeIndex; 2]) -> MeshResult<ElementIndex> {
        let vertices = [
            self.checked_node(nodes[0])?.xy(),
            self.checked_node(nodes[1])?.xy(),
        ];
        self.add_element(Element::edge(nodes, vertices)?)
    }

    /// 按节点数加入单元：3 个为三角形，2 个为线单元
    pub fn add_element_nodes(&mut self, nodes: &[NodeIndex]) -> MeshResult<ElementIndex> {
        match *nodes {
            [a, b, c] => self.add_triangle([a, b, c]),
            [a, b] => self.add_edge([a, b]),
            _ => Err(MeshError::NodeCountMismatch {
                kind: "element",
                required: 3,
                provided: nodes.len(),
            }),
        }
    }

    /// 加入已构造的单元
    ///
    /// 单元缓存的顶点必须与所引用节点的平面坐标一致。
    /// 已有同类型、同节点序列的单元时丢弃传入单元并返回已有编号。
    /// 新单元登记到各节点的相邻单元列表，并累积节点的集中质量与邻边长度。
    pub fn add_element(&mut self, element: Element) -> MeshResult<ElementIndex> {
        let tolerance = CONTAINMENT_EPS * element.max_edge_length();
        for (&n, &vertex) in element.nodes().iter().zip(element.vertices()) {
            let position = self.checked_node(n)?.xy();
            if vertex.distance(position) > tolerance {
                return Err(MeshError::invalid_topology(
                    "add_element",
                    format!("顶点 {vertex} 与节点 {n} 的坐标 {position} 不一致"),
                ));
            }
        }

        if let Some(existing) = self.find_element(&element) {
            return Ok(existing);
        }
        let key = ElementKey::of(&element);

        let id = ElementIndex::from_usize(self.elements.len());
        let share = element.volume() / element.n_nodes() as f64;
        for (local, &n) in element.nodes().iter().enumerate() {
            let (lengths, count) = element.incident_edge_lengths(local);
            self.nodes[n.as_usize()].register_element(id, share, &lengths[..count]);
        }

        self.lookup.insert(key, id);
        self.elements.push(element);
        Ok(id)
    }

    /// 与给定单元同类型、同节点序列的已有单元
    pub fn find_element(&self, element: &Element) -> Option<ElementIndex> {
        self.lookup.get(&ElementKey::of(element)).copied()
    }

    fn checked_node(&self, n: NodeIndex) -> MeshResult<&Node> {
        self.nodes.get(n.as_usize()).ok_or(MeshError::UnknownNode {
            node: n.as_usize(),
            n_nodes: self.nodes.len(),
        })
    }

    // =========================================================================
    // 访问
    // =========================================================================

    /// 节点数
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 单元数
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// 全部节点
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// 全部单元
    #[inline]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// 节点（编号越界时 panic）
    #[inline]
    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.as_usize()]
    }

    /// 单元（编号越界时 panic）
    #[inline]
    pub fn element(&self, idx: ElementIndex) -> &Element {
        &self.elements[idx.as_usize()]
    }

    /// 节点
    pub fn get_node(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx.as_usize())
    }

    /// 单元
    pub fn get_element_by_index(&self, idx: ElementIndex) -> Option<&Element> {
        self.elements.get(idx.as_usize())
    }

    /// 可变节点（用于追加模型数据）
    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(idx.as_usize())
    }

    /// 可变单元（用于追加模型数据）
    pub fn element_mut(&mut self, idx: ElementIndex) -> Option<&mut Element> {
        self.elements.get_mut(idx.as_usize())
    }

    /// 全部节点（可变）
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// 全部单元（可变）
    pub fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    /// 平面包围盒（所有节点，O(n) 扫描）
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.nodes.iter().map(Node::xy))
    }

    /// 三维包围盒（含高程）
    pub fn bounding_box_3d(&self) -> BoundingBox3d {
        let mut bb = BoundingBox3d::EMPTY;
        for n in &self.nodes {
            bb.expand(n.position());
        }
        bb
    }

    // =========================================================================
    // 点定位
    // =========================================================================

    /// 点定位树，首次调用时构建
    pub fn spatial_index(&self) -> &SpatialTree {
        self.spatial_index.get_or_init(|| self.build_spatial_index())
    }

    /// 点定位树是否已构建
    pub fn has_spatial_index(&self) -> bool {
        self.spatial_index.get().is_some()
    }

    /// 丢弃现有点定位树并立即重建
    pub fn rebuild_spatial_index(&mut self) -> &SpatialTree {
        self.spatial_index = OnceLock::new();
        self.spatial_index()
    }

    fn build_spatial_index(&self) -> SpatialTree {
        let objects_per_leaf = self.index_config.objects_per_leaf(self.elements.len());
        let mut bounds = BoundingBox::EMPTY;
        for e in &self.elements {
            let bb = e.bounding_box();
            bounds.expand(DVec2::new(bb.min_x, bb.min_y));
            bounds.expand(DVec2::new(bb.max_x, bb.max_y));
        }
        SpatialTree::build(
            &self.elements,
            bounds,
            objects_per_leaf,
            self.index_config.direction,
            self.index_config.parallel_root,
        )
    }

    /// 包含点 `p` 的单元
    ///
    /// 多个单元包含该点（共享边、共享顶点）时，返回候选列表中第一个命中的单元。
    pub fn get_element(&self, p: DVec2) -> Option<ElementIndex> {
        self.spatial_index()
            .search_candidates(p)
            .iter()
            .copied()
            .find(|&e| self.elements[e.as_usize()].contains_point(p))
    }

    /// 点定位并求自然坐标
    pub fn locate(&self, p: DVec2) -> Option<Location> {
        self.spatial_index()
            .search_candidates(p)
            .iter()
            .find_map(|&e| {
                self.elements[e.as_usize()]
                    .natural_coordinates(p)
                    .map(|coordinates| Location {
                        element: e,
                        coordinates,
                    })
            })
    }

    /// 用节点值在点 `p` 处插值
    pub fn interpolate(&self, p: DVec2, nodal: impl Fn(NodeIndex) -> f64) -> Option<f64> {
        let loc = self.locate(p)?;
        let element = self.element(loc.element);
        let values: Vec<f64> = element.nodes().iter().map(|&n| nodal(n)).collect();
        Some(loc.coordinates.interpolate(&values))
    }

    // =========================================================================
    // 检查与派生
    // =========================================================================

    /// 检查节点-单元双向引用是否一致
    pub fn validate(&self) -> MeshResult<()> {
        for (ei, e) in self.elements.iter().enumerate() {
            let id = ElementIndex::from_usize(ei);
            for &n in e.nodes() {
                let node = self.checked_node(n)?;
                if !node.elements().contains(&id) {
                    return Err(MeshError::invalid_topology(
                        "validate",
                        format!("单元 {ei} 引用节点 {n}, 但节点相邻列表中没有该单元"),
                    ));
                }
            }
        }
        for (ni, node) in self.nodes.iter().enumerate() {
            let id = NodeIndex::from_usize(ni);
            for &e in node.elements() {
                let element = self.get_element_by_index(e).ok_or_else(|| {
                    MeshError::invalid_topology(
                        "validate",
                        format!("节点 {ni} 的相邻单元 {e} 不存在"),
                    )
                })?;
                if !element.nodes().contains(&id) {
                    return Err(MeshError::invalid_topology(
                        "validate",
                        format!("节点 {ni} 列出单元 {e}, 但该单元不引用此节点"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// 单元着色：同色单元互不共享节点
    pub fn element_coloring(&self) -> ElementColoring {
        ElementColoring::from_shared_nodes(self)
    }

    /// 所有单元中最小的特征尺寸
    pub fn min_elm_size(&self) -> Option<f64> {
        self.elements
            .iter()
            .map(|e| e.elm_size())
            .min_by(|a, b| a.total_cmp(b))
    }
}
