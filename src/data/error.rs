//! 数据加载错误类型定义

use crate::errors::TensorError;
use std::path::PathBuf;
use thiserror::Error;

/// 数据加载相关错误
#[derive(Debug, Error)]
pub enum DataError {
    /// 数据集缺失或不完整（训练前的检查）
    #[error("数据集缺失: {0}")]
    DatasetMissing(String),

    /// 文件未找到
    #[error("文件未找到: {0}")]
    FileNotFound(PathBuf),

    /// 训练图像没有对应的标注图像
    #[error("图像{0}没有对应的道路标注")]
    UnpairedImage(PathBuf),

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 图像解码/编码错误
    #[error("图像{path}处理失败: {source}")]
    ImageError {
        path: PathBuf,
        source: image::ImageError,
    },

    /// 形状不匹配
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("无效参数: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Tensor(#[from] TensorError),
}
