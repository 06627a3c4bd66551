/*
 * @Author       : 老董
 * @Date         : 2023-10-21 03:22:26
 * @Description  : 张量的形状变换：reshape、permute，以及沿batch维的拼接与选取
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Axis, IxDyn, concatenate};
use std::collections::HashSet;

impl Tensor {
    pub fn reshape(&self, shape: &[usize]) -> Self {
        self.try_reshape(shape)
            .unwrap_or_else(|e| panic!("{}", e))
    }

    /// `reshape`的可失败版本：新旧形状的元素总数必须一致
    pub fn try_reshape(&self, shape: &[usize]) -> Result<Self, TensorError> {
        let new_total_elements: usize = shape.iter().product();
        if self.size() != new_total_elements {
            return Err(TensorError::IncompatibleShape);
        }
        let data = self
            .data
            .as_standard_layout()
            .into_owned()
            .into_shape(IxDyn(shape))
            .map_err(|_| TensorError::IncompatibleShape)?;
        Ok(Self::from_array(data))
    }

    /// 按`axes`重新排列各维度，如NCHW -> NHWC 即`permute(&[0, 2, 3, 1])`。
    /// `axes`必须是`0..dimension()`的一个排列，否则panic。
    pub fn permute(&self, axes: &[usize]) -> Self {
        let unique_axes = axes.iter().copied().collect::<HashSet<_>>();
        assert!(
            axes.len() == self.dimension()
                && unique_axes.len() == axes.len()
                && axes.iter().all(|&a| a < self.dimension()),
            "{}",
            TensorError::PermuteNeedUniqueAndInRange
        );
        Self::from_array(self.data.clone().permuted_axes(IxDyn(axes)))
    }

    /// 沿第0维（batch维）拼接多个张量，除第0维外其余维度必须一致
    pub fn concat_batch(tensors: &[&Self]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        if tensors
            .iter()
            .any(|t| t.dimension() != first.dimension() || t.shape()[1..] != first.shape()[1..])
        {
            return Err(TensorError::InconsitentShape);
        }
        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        let data = concatenate(Axis(0), &views).map_err(|_| TensorError::InconsitentShape)?;
        Ok(Self::from_array(data))
    }

    /// 取出batch维上第`index`个样本，保留batch维（结果形状为[1, ...]）
    pub fn select_batch(&self, index: usize) -> Self {
        assert!(
            index < self.shape()[0],
            "{}",
            TensorError::ValueMustSatisfyComparison {
                value_name: "index".to_string(),
                operator: crate::errors::ComparisonOperator::LessThan,
                threshold: self.shape()[0],
            }
        );
        let sample = self.data.index_axis(Axis(0), index).insert_axis(Axis(0));
        Self::from_array(sample.to_owned())
    }
}
