/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @Description  : 张量：基于`ndarray`动态维数组的f32张量，是计算图中节点值、梯度、参数的唯一载体。
 *                 图内统一采用 Batch-First 的 NCHW 排布：[batch, channel, height, width]。
 */

use ndarray::{Array, ArrayD, IxDyn};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::errors::{ComparisonOperator, TensorError};

mod image;
mod ops;
mod property;
mod shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、i32、f64等）就只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]...；
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        Self::try_new(data.to_vec(), shape).unwrap_or_else(|e| panic!("{}", e))
    }

    /// `new`的可失败版本，直接接管`data`的所有权
    pub fn try_new(data: Vec<f32>, shape: &[usize]) -> Result<Self, TensorError> {
        let data_len = data.len();
        let data = Array::from_shape_vec(IxDyn(shape), data).map_err(|_| {
            TensorError::DataShapeMismatch {
                data_len,
                shape: shape.to_vec(),
            }
        })?;
        Ok(Self { data })
    }

    /// 内部数据统一保持标准（C 顺序）连续布局
    pub(crate) fn from_array(data: ArrayD<f32>) -> Self {
        if data.is_standard_layout() {
            Self { data }
        } else {
            Self {
                data: data.as_standard_layout().into_owned(),
            }
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::ones(IxDyn(shape)),
        }
    }

    /// 创建一个所有元素都为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    /// 创建一个服从正态分布的随机张量（使用指定的随机数生成器，便于复现）
    pub fn normal_with_rng(mean: f32, std_dev: f32, shape: &[usize], rng: &mut StdRng) -> Self {
        let data_len = shape.iter().product::<usize>();
        let data = (0..data_len)
            .map(|_| mean + std_dev * standard_normal(rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }

    /// 创建一个服从截断正态分布的随机张量：落在均值两个标准差以外的样本会被重新采样。
    /// `std_dev`必须大于0，否则panic。
    pub fn truncated_normal_with_rng(
        mean: f32,
        std_dev: f32,
        shape: &[usize],
        rng: &mut StdRng,
    ) -> Self {
        assert!(
            std_dev > 0.0,
            "{}",
            TensorError::ValueMustSatisfyComparison {
                value_name: "std_dev".to_string(),
                operator: ComparisonOperator::GreaterThan,
                threshold: 0,
            }
        );
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);
        while data.len() < data_len {
            let z = standard_normal(rng);
            if z.abs() <= 2.0 {
                data.push(mean + std_dev * z);
            }
        }
        Self::new(&data, shape)
    }

    /// 创建一个值在[min, max)区间内均匀分布的随机张量
    pub fn uniform_with_rng(min: f32, max: f32, shape: &[usize], rng: &mut StdRng) -> Self {
        let data_len = shape.iter().product::<usize>();
        let data = (0..data_len)
            .map(|_| rng.gen_range(min..max))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }
}

/// Box-Muller 变换采样一个标准正态分布的数
fn standard_normal(rng: &mut StdRng) -> f32 {
    loop {
        let u1: f32 = rng.gen_range(0.0..1.0);
        let u2: f32 = rng.gen_range(0.0..1.0);
        if u1 <= f32::EPSILON {
            continue;
        }
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        if z.is_finite() {
            return z;
        }
    }
}
