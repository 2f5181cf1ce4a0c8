// crates/cf_mesh/src/geometry/bounds.rs

//! 轴对齐包围盒
//!
//! 平面包围盒用于点定位树的单元格和单元粗筛；
//! 三维包围盒仅用于报告网格的整体范围（含高程）。

use cf_config::SplitAxis;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// 平面轴对齐包围盒（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 最小 x 坐标
    pub min_x: f64,
    /// 最小 y 坐标
    pub min_y: f64,
    /// 最大 x 坐标
    pub max_x: f64,
    /// 最大 y 坐标
    pub max_y: f64,
}

impl BoundingBox {
    /// 空包围盒，任何 `expand` 都会覆盖它
    pub const EMPTY: Self = Self {
        min_x: f64::MAX,
        min_y: f64::MAX,
        max_x: f64::MIN,
        max_y: f64::MIN,
    };

    /// 从边界坐标直接创建
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// 包含所有给定点的最小包围盒
    pub fn from_points<I: IntoIterator<Item = DVec2>>(points: I) -> Self {
        let mut bb = Self::EMPTY;
        for p in points {
            bb.expand(p);
        }
        bb
    }

    /// 扩展以包含点
    #[inline]
    pub fn expand(&mut self, p: DVec2) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// 是否为空（未包含任何点）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// 检查点是否在包围盒内，边界上的点也算在内
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// 两个包围盒是否相交（闭区间，接触即相交）
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// 宽度
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// 高度
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// 中心点
    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    /// 指定方向上的下界
    #[inline]
    pub fn min_along(&self, axis: SplitAxis) -> f64 {
        match axis {
            SplitAxis::X => self.min_x,
            SplitAxis::Y => self.min_y,
        }
    }

    /// 较宽的方向（宽高相等时取 x）
    #[inline]
    pub fn wider_axis(&self) -> SplitAxis {
        if self.height() > self.width() {
            SplitAxis::Y
        } else {
            SplitAxis::X
        }
    }

    /// 在 `split` 处沿 `axis` 切分为左右（下上）两个单元格
    pub fn split(&self, axis: SplitAxis, split: f64) -> (BoundingBox, BoundingBox) {
        let mut left = *self;
        let mut right = *self;
        match axis {
            SplitAxis::X => {
                left.max_x = split;
                right.min_x = split;
            }
            SplitAxis::Y => {
                left.max_y = split;
                right.min_y = split;
            }
        }
        (left, right)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// 三维轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3d {
    /// 最小角点
    pub min: DVec3,
    /// 最大角点
    pub max: DVec3,
}

impl BoundingBox3d {
    /// 空包围盒
    pub const EMPTY: Self = Self {
        min: DVec3::new(f64::MAX, f64::MAX, f64::MAX),
        max: DVec3::new(f64::MIN, f64::MIN, f64::MIN),
    };

    /// 扩展以包含点
    #[inline]
    pub fn expand(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// 平面投影
    pub fn to_2d(&self) -> BoundingBox {
        BoundingBox::new(self.min.x, self.min.y, self.max.x, self.max.y)
    }
}

impl Default for BoundingBox3d {
    fn default() -> Self {
        Self::EMPTY
    }
}
