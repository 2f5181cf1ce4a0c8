// crates/cf_mesh/src/spatial_tree.rs

//! 点定位树
//!
//! 二叉空间划分树：每个内部节点沿一个坐标方向在分割值处切开，
//! 叶节点保存与其单元格可能重叠的单元列表。跨越分割线的单元同时进入两侧，
//! 因此一个单元可以出现在多个叶中。
//!
//! # 构建规则
//!
//! - 对象数小于每叶上限、深度达到 [`MAX_TREE_DEPTH`]、或单元格宽/高小于
//!   [`MIN_CELL_SIZE`] 时成为叶；
//! - 划分方向取配置中的固定方向，否则取单元格较宽的方向；
//! - 分割值为各单元包围盒在该方向下界的中位数；
//! - 任一顶点 `<= split` 的单元进入左侧，任一顶点 `>= split` 的单元进入右侧；
//! - 深度超过 [`DEGENERATE_SPLIT_DEPTH`] 后，若某一侧几乎没有减少对象，放弃划分；
//! - 根节点的两棵子树可并行构建，更深层串行。
//!
//! # 查询
//!
//! 从根开始，`p[axis] <= split` 走左侧，否则走右侧，返回到达叶的候选列表。
//! 候选顺序为加入顺序，但并不保证列表中只有包含该点的单元。

use cf_config::{SplitAxis, DEGENERATE_SPLIT_DEPTH, MAX_TREE_DEPTH, MIN_CELL_SIZE};
use cf_foundation::ElementIndex;
use glam::DVec2;

use crate::geometry::{BoundingBox, Element, ElementGeometry};

/// 树节点
#[derive(Debug)]
pub enum TreeNode {
    /// 叶节点
    Leaf {
        /// 单元格范围
        cell: BoundingBox,
        /// 候选单元
        elements: Vec<ElementIndex>,
    },
    /// 内部节点
    Split {
        /// 划分方向
        axis: SplitAxis,
        /// 分割值
        split: f64,
        /// `<= split` 一侧
        left: Box<TreeNode>,
        /// `> split` 一侧
        right: Box<TreeNode>,
    },
}

/// 构建统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TreeStats {
    /// 参与构建的单元数
    pub n_elements: usize,
    /// 叶节点数
    pub n_leaves: usize,
    /// 最大叶深度
    pub max_depth: usize,
    /// 所有叶中单元引用总数
    pub total_references: usize,
    /// 最大叶对象数
    pub max_leaf_size: usize,
}

impl TreeStats {
    /// 平均每个单元被引用的次数
    pub fn duplication_ratio(&self) -> f64 {
        if self.n_elements == 0 {
            0.0
        } else {
            self.total_references as f64 / self.n_elements as f64
        }
    }
}

/// 点定位树
#[derive(Debug)]
pub struct SpatialTree {
    root: TreeNode,
    objects_per_leaf: usize,
    stats: TreeStats,
}

struct TreeBuilder<'a> {
    elements: &'a [Element],
    objects_per_leaf: usize,
    direction: Option<SplitAxis>,
}

impl<'a> TreeBuilder<'a> {
    fn build(
        &self,
        objects: Vec<ElementIndex>,
        cell: BoundingBox,
        depth: usize,
        parallel: bool,
    ) -> TreeNode {
        if objects.len() < self.objects_per_leaf
            || depth >= MAX_TREE_DEPTH
            || cell.width() < MIN_CELL_SIZE
            || cell.height() < MIN_CELL_SIZE
        {
            return TreeNode::Leaf {
                cell,
                elements: objects,
            };
        }

        let axis = self.direction.unwrap_or_else(|| cell.wider_axis());
        let split = self.median_lower_bound(&objects, axis);
        let c = axis.component();

        let mut left = Vec::new();
        let mut right = Vec::new();
        for &idx in &objects {
            let vertices = self.elements[idx.as_usize()].vertices();
            if vertices.iter().any(|v| v[c] <= split) {
                left.push(idx);
            }
            if vertices.iter().any(|v| v[c] >= split) {
                right.push(idx);
            }
        }

        let guard = self.objects_per_leaf.min(5).max(2);
        let limit = objects.len().saturating_sub(guard);
        if (left.len() > limit || right.len() > limit) && depth > DEGENERATE_SPLIT_DEPTH {
            return TreeNode::Leaf {
                cell,
                elements: objects,
            };
        }
        drop(objects);

        let (left_cell, right_cell) = cell.split(axis, split);
        let (left_node, right_node) = if parallel {
            rayon::join(
                || self.build(left, left_cell, depth + 1, false),
                || self.build(right, right_cell, depth + 1, false),
            )
        } else {
            (
                self.build(left, left_cell, depth + 1, false),
                self.build(right, right_cell, depth + 1, false),
            )
        };

        TreeNode::Split {
            axis,
            split,
            left: Box::new(left_node),
            right: Box::new(right_node),
        }
    }

    fn median_lower_bound(&self, objects: &[ElementIndex], axis: SplitAxis) -> f64 {
        let mut keys: Vec<f64> = objects
            .iter()
            .map(|idx| self.elements[idx.as_usize()].bounding_box().min_along(axis))
            .collect();
        let mid = keys.len() / 2;
        let (_, median, _) = keys.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        *median
    }
}

impl SpatialTree {
    /// 对全部单元构建
    ///
    /// `bounds` 为根单元格，通常取网格平面包围盒。
    pub fn build(
        elements: &[Element],
        bounds: BoundingBox,
        objects_per_leaf: usize,
        direction: Option<SplitAxis>,
        parallel_root: bool,
    ) -> Self {
        let objects_per_leaf = objects_per_leaf.max(1);
        let builder = TreeBuilder {
            elements,
            objects_per_leaf,
            direction,
        };
        let objects: Vec<ElementIndex> =
            (0..elements.len()).map(ElementIndex::from_usize).collect();
        let root = builder.build(objects, bounds, 0, parallel_root);

        let mut stats = TreeStats {
            n_elements: elements.len(),
            ..Default::default()
        };
        collect_stats(&root, 0, &mut stats);
        log::debug!(
            "点定位树构建完成: {} 单元, {} 叶, 最大深度 {}, 引用倍数 {:.2}",
            stats.n_elements,
            stats.n_leaves,
            stats.max_depth,
            stats.duplication_ratio()
        );

        Self {
            root,
            objects_per_leaf,
            stats,
        }
    }

    /// 点所在叶的候选单元
    pub fn search_candidates(&self, p: DVec2) -> &[ElementIndex] {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { elements, .. } => return elements,
                TreeNode::Split {
                    axis,
                    split,
                    left,
                    right,
                } => {
                    node = if p[axis.component()] <= *split { left } else { right };
                }
            }
        }
    }

    /// 所有叶（深度优先，左先于右）
    pub fn leaves(&self) -> Vec<(&BoundingBox, &[ElementIndex])> {
        let mut out = Vec::with_capacity(self.stats.n_leaves);
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                TreeNode::Leaf { cell, elements } => out.push((cell, elements.as_slice())),
                TreeNode::Split { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        out
    }

    /// 根节点
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// 每叶对象数上限
    pub fn objects_per_leaf(&self) -> usize {
        self.objects_per_leaf
    }

    /// 构建统计
    pub fn stats(&self) -> TreeStats {
        self.stats
    }
}

fn collect_stats(node: &TreeNode, depth: usize, stats: &mut TreeStats) {
    match node {
        TreeNode::Leaf { elements, .. } => {
            stats.n_leaves += 1;
            stats.max_depth = stats.max_depth.max(depth);
            stats.total_references += elements.len();
            stats.max_leaf_size = stats.max_leaf_size.max(elements.len());
        }
        TreeNode::Split { left, right, .. } => {
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}
