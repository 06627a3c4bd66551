use crate::data::DataError;
use crate::nn::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// 分割网络（骨干加载、解码器、训练、推理）层面的错误
#[derive(Debug, Error)]
pub enum FcnError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("无效的saved-model目录{path}：{reason}")]
    InvalidSavedModel { path: PathBuf, reason: String },

    #[error("saved-model缺少标签`{0}`")]
    MissingTag(String),

    #[error("saved-model的格式版本为{found}，至少需要{required}")]
    UnsupportedVersion { found: u32, required: u32 },

    #[error("变量文件中缺少变量`{0}`")]
    MissingVariable(String),

    #[error("变量`{name}`的形状应为{expected:?}，实际为{got:?}")]
    VariableShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("序列化失败：{0}")]
    Serialization(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("图像处理失败：{0}")]
    Image(String),

    #[error("无效的配置：{0}")]
    InvalidConfig(String),
}
