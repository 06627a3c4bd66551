/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : GraphInner 参数序列化（save_params/load_params）
 *
 * 参数文件即按名称排列的张量列表，整体用bincode编码，开头带魔数与版本号以便校验。
 * 骨干网络检查点中的`variables.bin`也是这种格式。
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// 参数文件：（名称，张量）列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamsFile {
    magic: [u8; 4],
    version: u32,
    pub entries: Vec<(String, Tensor)>,
}

impl ParamsFile {
    /// 参数文件魔数
    const MAGIC: [u8; 4] = *b"RFCN";
    /// 参数文件版本
    const VERSION: u32 = 1;

    pub const fn new(entries: Vec<(String, Tensor)>) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            entries,
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        let file = File::create(path.as_ref())
            .map_err(|e| GraphError::Serialization(format!("无法创建参数文件: {e}")))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .map_err(|e| GraphError::Serialization(format!("写入参数文件失败: {e}")))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let file = File::open(path.as_ref())
            .map_err(|e| GraphError::Serialization(format!("无法打开参数文件: {e}")))?;
        let params: Self = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| GraphError::Serialization(format!("读取参数文件失败: {e}")))?;
        if params.magic != Self::MAGIC {
            return Err(GraphError::Serialization(
                "无效的参数文件：魔数不匹配".to_string(),
            ));
        }
        if params.version != Self::VERSION {
            return Err(GraphError::Serialization(format!(
                "不支持的参数文件版本: {}",
                params.version
            )));
        }
        Ok(params)
    }

    /// 按名称查找张量
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, tensor)| tensor)
    }
}

impl GraphInner {
    /// 把指定参数节点的当前值保存到文件（以节点名为键）
    pub fn save_params<P: AsRef<Path>>(&self, params: &[NodeId], path: P) -> Result<(), GraphError> {
        let entries = params
            .iter()
            .map(|&id| {
                let node = self.get_node(id)?;
                let value = node.value().ok_or_else(|| {
                    GraphError::ComputationError(format!("参数{node}没有值"))
                })?;
                Ok((node.name().to_string(), value.clone()))
            })
            .collect::<Result<Vec<_>, GraphError>>()?;
        ParamsFile::new(entries).save(path)
    }

    /// 从文件加载参数值到指定参数节点（按节点名匹配，形状须一致）
    pub fn load_params<P: AsRef<Path>>(&mut self, params: &[NodeId], path: P) -> Result<(), GraphError> {
        let file = ParamsFile::load(path)?;
        for &id in params {
            let name = self.get_node_name(id)?.to_string();
            let value = file.get(&name).ok_or_else(|| {
                GraphError::Serialization(format!("参数文件中缺少参数`{name}`"))
            })?;
            self.set_node_value(id, Some(value))?;
        }
        Ok(())
    }
}
