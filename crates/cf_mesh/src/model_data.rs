// crates/cf_mesh/src/model_data.rs

//! 模型数据挂载
//!
//! 每个节点和单元都持有一个 [`ModelDataSet`]：按追加顺序保存的异构记录列表。
//! 多个物理模型可以在同一网格上各自挂载私有状态，互不可见。
//!
//! # 访问方式
//!
//! - [`ModelDataKey<T>`]: 追加时返回的类型化句柄，记录了槽位，访问时按类型下转型。
//!   引擎按节点保存句柄表 [`ModelDataKeys`]，不依赖各节点追加顺序一致。
//! - [`LookupIndexCache`]: 按记录类型学习"第一次出现的位置"，之后直接按位置读取。
//!   只有当所有者按相同顺序追加同类记录时结果才正确，可用 [`LookupIndexCache::verify`] 检查。
//!
//! 记录追加后不会被移除或重排，槽位在所有者生命期内稳定。

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::error::{MeshError, MeshResult};

/// 一条模型数据记录
pub type ModelRecord = dyn Any + Send + Sync + 'static;

/// 类型化的模型数据句柄
///
/// 槽位即追加时的位置，只在创建它的那个集合上有意义。
pub struct ModelDataKey<T> {
    slot: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ModelDataKey<T> {}

impl<T> Clone for ModelDataKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for ModelDataKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<T> Eq for ModelDataKey<T> {}

impl<T> std::fmt::Debug for ModelDataKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelDataKey<{}>({})", type_name::<T>(), self.slot)
    }
}

impl<T> ModelDataKey<T> {
    /// 记录在集合中的位置
    #[inline]
    pub fn slot(self) -> usize {
        self.slot as usize
    }
}

/// 异构模型数据列表（只追加）
#[derive(Default)]
pub struct ModelDataSet {
    records: Vec<Box<ModelRecord>>,
}

impl std::fmt::Debug for ModelDataSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDataSet")
            .field("len", &self.records.len())
            .finish()
    }
}

impl ModelDataSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录，返回其句柄
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) -> ModelDataKey<T> {
        let slot = self.records.len() as u32;
        self.records.push(Box::new(value));
        ModelDataKey {
            slot,
            _marker: PhantomData,
        }
    }

    /// 记录数
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按位置取记录
    #[inline]
    pub fn at(&self, index: usize) -> Option<&ModelRecord> {
        self.records.get(index).map(|r| &**r)
    }

    /// 按句柄取记录
    pub fn get<T: Any>(&self, key: ModelDataKey<T>) -> MeshResult<&T> {
        self.records
            .get(key.slot())
            .and_then(|r| r.downcast_ref::<T>())
            .ok_or(MeshError::ModelDataType {
                slot: key.slot(),
                expected: type_name::<T>(),
            })
    }

    /// 按句柄取可变记录
    pub fn get_mut<T: Any>(&mut self, key: ModelDataKey<T>) -> MeshResult<&mut T> {
        let slot = key.slot();
        self.records
            .get_mut(slot)
            .and_then(|r| r.downcast_mut::<T>())
            .ok_or(MeshError::ModelDataType {
                slot,
                expected: type_name::<T>(),
            })
    }

    /// 按位置取记录并下转型
    pub fn downcast_at<T: Any>(&self, index: usize) -> Option<&T> {
        self.records.get(index).and_then(|r| r.downcast_ref::<T>())
    }

    /// 按身份（地址）查找记录位置
    ///
    /// 只比较地址，不比较内容。零大小类型的记录共享同一地址，无法区分。
    pub fn index_of<R: ?Sized>(&self, record: &R) -> Option<usize> {
        let target = record as *const R as *const ();
        self.records
            .iter()
            .position(|r| &**r as *const ModelRecord as *const () == target)
    }

    /// 类型 `T` 第一次出现的位置
    pub fn position_of<T: Any>(&self) -> Option<usize> {
        self.records.iter().position(|r| r.is::<T>())
    }

    /// 当前所有记录的只读视图
    ///
    /// 视图借用集合，存活期间集合无法被修改；可以多次遍历。
    pub fn view(&self) -> ModelDataView<'_> {
        ModelDataView {
            records: &self.records,
        }
    }
}

/// 模型数据只读视图
#[derive(Clone, Copy)]
pub struct ModelDataView<'a> {
    records: &'a [Box<ModelRecord>],
}

impl<'a> ModelDataView<'a> {
    /// 记录数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按位置取记录
    pub fn get(&self, index: usize) -> Option<&'a ModelRecord> {
        self.records.get(index).map(|r| &**r)
    }

    /// 遍历（可重复调用，每次从头开始）
    pub fn iter(&self) -> impl Iterator<Item = &'a ModelRecord> + 'a {
        self.records.iter().map(|r| &**r)
    }
}

impl<'a> IntoIterator for ModelDataView<'a> {
    type Item = &'a ModelRecord;
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, Box<ModelRecord>>,
        fn(&'a Box<ModelRecord>) -> &'a ModelRecord,
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn unbox<'r>(record: &'r Box<ModelRecord>) -> &'r ModelRecord {
            &**record
        }
        self.records.iter().map(unbox as fn(&'a Box<ModelRecord>) -> &'a ModelRecord)
    }
}

/// 按所有者（节点或单元）排列的句柄表
///
/// 第 i 项是第 i 个所有者上该模型记录的句柄。
pub struct ModelDataKeys<T> {
    keys: Vec<ModelDataKey<T>>,
}

impl<T> Default for ModelDataKeys<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T> std::fmt::Debug for ModelDataKeys<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDataKeys")
            .field("type", &type_name::<T>())
            .field("len", &self.keys.len())
            .finish()
    }
}

impl<T> ModelDataKeys<T> {
    /// 预分配容量
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    /// 追加下一个所有者的句柄
    pub fn push(&mut self, key: ModelDataKey<T>) {
        self.keys.push(key);
    }

    /// 第 `owner` 个所有者的句柄
    #[inline]
    pub fn get(&self, owner: usize) -> Option<ModelDataKey<T>> {
        self.keys.get(owner).copied()
    }

    /// 所有者数
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 若所有所有者的槽位相同，返回该槽位
    pub fn uniform_slot(&self) -> Option<usize> {
        let first = self.keys.first()?.slot();
        self.keys
            .iter()
            .all(|k| k.slot() == first)
            .then_some(first)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheSlot {
    Searching,
    Learned(usize),
}

/// 按类型学习记录位置的查找缓存
///
/// 每种类型第一次查询时线性扫描，找到后记住位置，之后的查询直接按位置读取，
/// 不再确认该位置上的记录类型是否仍然匹配其他所有者。
#[derive(Debug, Default)]
pub struct LookupIndexCache {
    slots: RwLock<HashMap<TypeId, CacheSlot>>,
}

impl LookupIndexCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程共享的缓存实例
    pub fn global() -> &'static LookupIndexCache {
        static GLOBAL: OnceLock<LookupIndexCache> = OnceLock::new();
        GLOBAL.get_or_init(LookupIndexCache::new)
    }

    /// 已学习到的位置
    pub fn learned<T: Any>(&self) -> Option<usize> {
        match self.slots.read().get(&TypeId::of::<T>()) {
            Some(CacheSlot::Learned(i)) => Some(*i),
            _ => None,
        }
    }

    /// 解析类型 `T` 在 `set` 中的位置
    ///
    /// 已学习时直接返回缓存位置；否则扫描 `set`，找到则记住。
    pub fn resolve<T: Any>(&self, set: &ModelDataSet) -> Option<usize> {
        let id = TypeId::of::<T>();
        if let Some(CacheSlot::Learned(i)) = self.slots.read().get(&id) {
            return Some(*i);
        }

        let mut slots = self.slots.write();
        // 两次加锁之间可能已被其他线程学习
        if let Some(CacheSlot::Learned(i)) = slots.get(&id) {
            return Some(*i);
        }
        match set.position_of::<T>() {
            Some(i) => {
                slots.insert(id, CacheSlot::Learned(i));
                Some(i)
            }
            None => {
                slots.insert(id, CacheSlot::Searching);
                None
            }
        }
    }

    /// 用缓存位置读取 `T` 类型的记录
    pub fn get<'a, T: Any>(&self, set: &'a ModelDataSet) -> Option<&'a T> {
        let index = self.resolve::<T>(set)?;
        set.downcast_at::<T>(index)
    }

    /// 遗忘类型 `T` 的位置
    pub fn forget<T: Any>(&self) {
        self.slots.write().remove(&TypeId::of::<T>());
    }

    /// 清空全部缓存
    pub fn clear(&self) {
        self.slots.write().clear();
    }

    /// 检查缓存位置与每个所有者中 `T` 的实际位置是否一致
    ///
    /// 尚未学习时以第一个含 `T` 的所有者为准（不写回缓存）。
    pub fn verify<'a, T, I>(&self, owners: I) -> MeshResult<()>
    where
        T: Any,
        I: IntoIterator<Item = &'a ModelDataSet>,
    {
        let mut expected = self.learned::<T>();
        for (owner, set) in owners.into_iter().enumerate() {
            let actual = set.position_of::<T>();
            if expected.is_none() {
                expected = actual;
                continue;
            }
            if actual != expected {
                return Err(MeshError::ModelDataOrder {
                    kind: type_name::<T>(),
                    owner,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
