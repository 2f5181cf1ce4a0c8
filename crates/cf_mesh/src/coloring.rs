// crates/cf_mesh/src/coloring.rs

//! 单元着色
//!
//! 共享任一节点的两个单元视为相邻，贪心着色后同色单元互不共享节点。
//! 单元循环按颜色分批并行时，同一批内对节点记录的写入不会冲突。

use std::cmp::Reverse;

use cf_foundation::ElementIndex;

use crate::decomposition::Decomposition;
use crate::geometry::ElementGeometry;

/// 着色结果
#[derive(Debug, Clone, Default)]
pub struct ElementColoring {
    colors: Vec<u32>,
    batches: Vec<Vec<ElementIndex>>,
}

impl ElementColoring {
    /// 按共享节点关系着色
    ///
    /// 度数高的单元先着色（度数相同时按编号），每批内单元按编号升序排列，结果确定。
    pub fn from_shared_nodes(mesh: &Decomposition) -> Self {
        let n = mesh.n_elements();
        if n == 0 {
            return Self::default();
        }

        let neighbours = move |e: usize| {
            mesh.elements()[e]
                .nodes()
                .iter()
                .flat_map(move |&node| mesh.node(node).elements().iter().copied())
                .filter(move |&other| other.as_usize() != e)
        };

        let degree: Vec<usize> = (0..n)
            .map(|e| {
                let mut adj: Vec<ElementIndex> = neighbours(e).collect();
                adj.sort_unstable();
                adj.dedup();
                adj.len()
            })
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&e| Reverse(degree[e]));

        let mut colors = vec![u32::MAX; n];
        let mut used = Vec::new();
        let mut n_colors = 0u32;
        for e in order {
            used.clear();
            used.extend(
                neighbours(e)
                    .map(|other| colors[other.as_usize()])
                    .filter(|&c| c != u32::MAX),
            );
            let mut color = 0u32;
            while used.contains(&color) {
                color += 1;
            }
            colors[e] = color;
            n_colors = n_colors.max(color + 1);
        }

        let mut batches = vec![Vec::new(); n_colors as usize];
        for (e, &c) in colors.iter().enumerate() {
            batches[c as usize].push(ElementIndex::from_usize(e));
        }

        log::debug!("单元着色: {} 单元, {} 色", n, n_colors);
        Self { colors, batches }
    }

    /// 颜色数
    pub fn n_colors(&self) -> usize {
        self.batches.len()
    }

    /// 按颜色分组的单元
    pub fn batches(&self) -> &[Vec<ElementIndex>] {
        &self.batches
    }

    /// 单元的颜色
    pub fn color_of(&self, element: ElementIndex) -> Option<usize> {
        self.colors.get(element.as_usize()).map(|&c| c as usize)
    }

    /// 检查同色单元是否都不共享节点
    pub fn is_valid(&self, mesh: &Decomposition) -> bool {
        for node in mesh.nodes() {
            let mut seen: Vec<u32> = node
                .elements()
                .iter()
                .filter_map(|&e| self.colors.get(e.as_usize()).copied())
                .collect();
            let before = seen.len();
            seen.sort_unstable();
            seen.dedup();
            if seen.len() != before {
                return false;
            }
        }
        true
    }

    /// 负载均衡度 (1.0 = 完美均衡)
    pub fn balance_factor(&self) -> f64 {
        let min_size = self.batches.iter().map(Vec::len).min().unwrap_or(0);
        let max_size = self.batches.iter().map(Vec::len).max().unwrap_or(0);
        if max_size == 0 {
            1.0
        } else {
            min_size as f64 / max_size as f64
        }
    }
}
