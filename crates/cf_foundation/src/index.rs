// crates/cf_foundation/src/index.rs

//! 强类型稠密索引
//!
//! 网格中的节点与单元都保存在按创建顺序排列的连续数组中，
//! 索引值即全局唯一编号。`Idx<Tag>` 通过标记类型区分不同数组的索引，
//! 编译期防止节点索引与单元索引混用。
//!
//! "是否是同一个节点" 只需比较索引，不依赖对象地址。
//!
//! # 示例
//!
//! ```
//! use cf_foundation::index::{NodeIndex, ElementIndex};
//!
//! let n = NodeIndex::new(3);
//! assert_eq!(n.as_usize(), 3);
//! assert!(n.is_valid());
//! assert!(!NodeIndex::INVALID.is_valid());
//!
//! let e: ElementIndex = 7usize.into();
//! assert_eq!(usize::from(e), 7);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// 无效索引标记
pub const INVALID_INDEX: u32 = u32::MAX;

// ============================================================================
// 标记类型
// ============================================================================

/// 节点索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeTag;

/// 单元索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementTag;

// ============================================================================
// 泛型索引类型
// ============================================================================

/// 轻量级类型安全索引（4字节）
///
/// 与 `u32` 相同的内存布局。`PhantomData<fn() -> Tag>` 保证无论 `Tag`
/// 是什么类型，索引本身都可以 `Copy`、`Send` 与 `Sync`。
#[repr(transparent)]
pub struct Idx<Tag> {
    index: u32,
    _marker: PhantomData<fn() -> Tag>,
}

impl<Tag> Copy for Idx<Tag> {}

impl<Tag> Clone for Idx<Tag> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag> Idx<Tag> {
    /// 无效索引常量
    pub const INVALID: Self = Self {
        index: INVALID_INDEX,
        _marker: PhantomData,
    };

    /// 创建新索引
    ///
    /// Debug 模式下传入 `u32::MAX` 会 panic（与 INVALID 冲突）。
    #[inline]
    pub const fn new(index: u32) -> Self {
        debug_assert!(index != INVALID_INDEX, "index cannot be u32::MAX (reserved for INVALID)");
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// 从 `usize` 创建索引
    #[inline]
    pub fn from_usize(index: usize) -> Self {
        debug_assert!(index < INVALID_INDEX as usize, "索引超出 u32 范围");
        Self::new(index as u32)
    }

    /// 原始索引值
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// 转换为 `usize`
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.index as usize
    }

    /// 是否有效
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.index != INVALID_INDEX
    }

    /// 转换为 `Option<usize>`
    #[inline]
    pub fn to_option(self) -> Option<usize> {
        if self.is_valid() {
            Some(self.as_usize())
        } else {
            None
        }
    }
}

impl<Tag> Default for Idx<Tag> {
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

impl<Tag> PartialEq for Idx<Tag> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<Tag> Eq for Idx<Tag> {}

impl<Tag> PartialOrd for Idx<Tag> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<Tag> Ord for Idx<Tag> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<Tag> Hash for Idx<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<Tag> fmt::Debug for Idx<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Idx({})", self.index)
        } else {
            write!(f, "Idx(INVALID)")
        }
    }
}

impl<Tag> fmt::Display for Idx<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.index)
        } else {
            write!(f, "INVALID")
        }
    }
}

impl<Tag> From<u32> for Idx<Tag> {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl<Tag> From<usize> for Idx<Tag> {
    #[inline]
    fn from(value: usize) -> Self {
        Self::from_usize(value)
    }
}

impl<Tag> From<Idx<Tag>> for usize {
    #[inline]
    fn from(idx: Idx<Tag>) -> Self {
        idx.as_usize()
    }
}

// 持久化格式中索引就是裸整数，序列化时不带任何包装
impl<Tag> Serialize for Idx<Tag> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index)
    }
}

impl<'de, Tag> Deserialize<'de> for Idx<Tag> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u32::deserialize(deserializer)?;
        Ok(Self {
            index,
            _marker: PhantomData,
        })
    }
}

/// 节点索引
pub type NodeIndex = Idx<NodeTag>;

/// 单元索引
pub type ElementIndex = Idx<ElementTag>;

/// 快速创建节点索引
#[inline]
pub fn node(index: usize) -> NodeIndex {
    NodeIndex::from_usize(index)
}

/// 快速创建单元索引
#[inline]
pub fn element(index: usize) -> ElementIndex {
    ElementIndex::from_usize(index)
}
