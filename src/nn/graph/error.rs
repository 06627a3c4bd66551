/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : Graph 模块的错误类型
 */

use crate::nn::NodeId;
use crate::nn::shape::DynamicShape;
use thiserror::Error;

/// Graph 操作错误类型
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("计算图中不存在节点{0}")]
    NodeNotFound(NodeId),
    #[error("非法操作：{0}")]
    InvalidOperation(String),
    #[error("形状不匹配：期望{expected}，实际为{got}。{message}")]
    ShapeMismatch {
        expected: DynamicShape,
        got: DynamicShape,
        message: String,
    },
    #[error("维度不匹配：期望{expected}维，实际为{got}维。{message}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        message: String,
    },
    #[error("计算错误：{0}")]
    ComputationError(String),
    #[error("节点名称`{0}`在图中已存在")]
    DuplicateNodeName(String),
    #[error("参数（反）序列化失败：{0}")]
    Serialization(String),
}
