/*
 * DynamicShape: 支持动态维度的形状系统
 *
 * 类似 Keras/TensorFlow 的 (None, 128) 设计，允许某些维度在建图时未知。
 * 本crate中 batch 维度总是动态的：训练时为 batch_size（最后一批可能更短），推理时为 1。
 *
 * # 示例
 * ```
 * use road_fcn::nn::DynamicShape;
 *
 * let dynamic_batch = DynamicShape::with_dynamic_batch(&[3, 160, 576]);
 * assert_eq!(dynamic_batch.to_string(), "[?, 3, 160, 576]");
 * assert!(dynamic_batch.is_compatible_with_tensor(&[8, 3, 160, 576]));
 * ```
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// 维度值：Some(n) 表示固定值 n，None 表示动态（任意值）
pub type Dim = Option<usize>;

/// 动态形状：支持动态维度的形状表示
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DynamicShape {
    dims: Vec<Dim>,
}

impl DynamicShape {
    pub fn new(dims: &[Dim]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    /// 从固定形状创建（所有维度都是确定的）
    pub fn fixed(dims: &[usize]) -> Self {
        Self {
            dims: dims.iter().map(|&d| Some(d)).collect(),
        }
    }

    /// 创建一个动态 batch 的形状：第一维是 None（动态），其余维度固定。
    pub fn with_dynamic_batch(feature_dims: &[usize]) -> Self {
        let mut dims = vec![None];
        dims.extend(feature_dims.iter().map(|&d| Some(d)));
        Self { dims }
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// 获取指定维度的值（越界时视为动态）
    pub fn dim(&self, index: usize) -> Dim {
        self.dims.get(index).copied().flatten()
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// 检查两个形状是否兼容：维数相同，且每一维要么相等、要么至少一方为动态
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.ndim() == other.ndim()
            && self
                .dims
                .iter()
                .zip(&other.dims)
                .all(|(a, b)| match (a, b) {
                    (Some(x), Some(y)) => x == y,
                    _ => true,
                })
    }

    /// 检查实际张量形状是否与本形状兼容
    pub fn is_compatible_with_tensor(&self, tensor_shape: &[usize]) -> bool {
        self.is_compatible(&Self::fixed(tensor_shape))
    }

    /// 若所有维度均确定，返回对应的 Vec<usize>
    pub fn to_vec_fixed(&self) -> Option<Vec<usize>> {
        self.dims.iter().copied().collect()
    }
}

impl fmt::Display for DynamicShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self
            .dims
            .iter()
            .map(|d| d.map_or_else(|| "?".to_string(), |n| n.to_string()))
            .collect::<Vec<_>>();
        write!(f, "[{}]", dims.join(", "))
    }
}

impl From<&[usize]> for DynamicShape {
    fn from(shape: &[usize]) -> Self {
        Self::fixed(shape)
    }
}
