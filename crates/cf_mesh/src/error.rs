// crates/cf_mesh/src/error.rs

//! 网格处理错误类型
//!
//! 包含退化几何、拓扑引用、模型数据顺序等错误定义。
//! 所有错误可转换为 `cf_foundation::CfError` 向上传播。
//!
//! 点定位未命中不是错误，查询接口统一返回 `Option`。

use cf_foundation::CfError;
use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 退化单元（面积/长度为零、接近零或顶点顺时针）
    #[error("退化单元: {kind}, 节点 {nodes:?}, {measure_name}={measure:.3e}")]
    DegenerateElement {
        /// 单元类型
        kind: &'static str,
        /// 单元节点
        nodes: Vec<usize>,
        /// 度量名称
        measure_name: &'static str,
        /// 度量值
        measure: f64,
    },

    /// 引用了不存在的节点
    #[error("节点 {node} 不存在 (节点总数 {n_nodes})")]
    UnknownNode {
        /// 引用的节点编号
        node: usize,
        /// 当前节点总数
        n_nodes: usize,
    },

    /// 单元节点数与类型不符
    #[error("单元节点数不匹配: {kind} 需要 {required} 个节点, 提供 {provided}")]
    NodeCountMismatch {
        /// 单元类型
        kind: &'static str,
        /// 需要的节点数
        required: usize,
        /// 提供的节点数
        provided: usize,
    },

    /// 拓扑不一致
    #[error("拓扑错误: {operation} 失败, {details}")]
    InvalidTopology {
        /// 操作名称
        operation: &'static str,
        /// 详细信息
        details: String,
    },

    /// 模型数据追加顺序在某节点上与缓存位置不一致
    #[error("模型数据顺序不一致: 类型 {kind} 缓存位置 {expected:?}, 所有者 {owner} 实际位置 {actual:?}")]
    ModelDataOrder {
        /// 记录类型
        kind: &'static str,
        /// 不一致的所有者编号
        owner: usize,
        /// 缓存位置
        expected: Option<usize>,
        /// 实际位置
        actual: Option<usize>,
    },

    /// 模型数据句柄与记录类型不符
    #[error("模型数据类型不匹配: 位置 {slot} 处不是 {expected}")]
    ModelDataType {
        /// 句柄槽位
        slot: usize,
        /// 期望的记录类型
        expected: &'static str,
    },

    /// 网格快照格式错误
    #[error("网格快照错误: {0}")]
    Snapshot(String),
}

impl MeshError {
    /// 拓扑错误
    pub fn invalid_topology(operation: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidTopology {
            operation,
            details: details.into(),
        }
    }

    /// 退化单元
    pub fn degenerate(
        kind: &'static str,
        nodes: Vec<usize>,
        measure_name: &'static str,
        measure: f64,
    ) -> Self {
        Self::DegenerateElement {
            kind,
            nodes,
            measure_name,
            measure,
        }
    }
}

/// 转换到 Foundation 层错误
impl From<MeshError> for CfError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::UnknownNode { node, n_nodes } => {
                CfError::index_out_of_bounds("node", node, n_nodes)
            }
            MeshError::NodeCountMismatch { required, provided, .. } => {
                CfError::size_mismatch("element_nodes", required, provided)
            }
            MeshError::Snapshot(message) => CfError::serialization(message),
            wrong_key @ MeshError::ModelDataType { .. } => {
                CfError::invalid_input(wrong_key.to_string())
            }
            other => CfError::invalid_mesh(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_to_foundation() {
        let err: CfError = MeshError::UnknownNode { node: 9, n_nodes: 4 }.into();
        assert!(matches!(err, CfError::IndexOutOfBounds { index: 9, len: 4, .. }));
    }

    #[test]
    fn test_wrong_key_is_invalid_input() {
        let err: CfError = MeshError::ModelDataType {
            slot: 2,
            expected: "f64",
        }
        .into();
        assert!(matches!(err, CfError::InvalidInput { .. }));
    }

    #[test]
    fn test_degenerate_message() {
        let err = MeshError::degenerate("triangle", vec![0, 1, 2], "area", 0.0);
        let foundation: CfError = err.into();
        assert!(foundation.to_string().contains("退化单元"));
    }
}
