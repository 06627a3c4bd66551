/*
 * @Author       : 老董
 * @Date         : 2025-01-21
 * @Description  : 批数据与批数据来源
 */

use super::DataError;
use crate::tensor::Tensor;

/// 一批训练样本：图像`[N, 3, H, W]`与 one-hot 标签`[N, C, H, W]`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub images: Tensor,
    pub labels: Tensor,
}

impl Batch {
    /// 校验图像与标签：须均为4维，样本数相同，空间尺寸相同
    pub fn new(images: Tensor, labels: Tensor) -> Result<Self, DataError> {
        let (image_shape, label_shape) = (images.shape(), labels.shape());
        if image_shape.len() != 4
            || label_shape.len() != 4
            || image_shape[0] != label_shape[0]
            || image_shape[2..] != label_shape[2..]
        {
            return Err(DataError::ShapeMismatch {
                expected: image_shape.to_vec(),
                got: label_shape.to_vec(),
            });
        }
        Ok(Self { images, labels })
    }

    /// 样本数
    pub fn len(&self) -> usize {
        self.images.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 训练循环的批数据来源。每个 epoch 调用一次`batches`，
/// 返回的迭代器依次产出该 epoch 的所有批次（最后一批可以不满）。
pub trait BatchSource {
    fn batches(
        &mut self,
        batch_size: usize,
    ) -> Box<dyn Iterator<Item = Result<Batch, DataError>> + '_>;
}

/// 任何`FnMut(batch_size) -> 可迭代批次`的闭包都可以作为批数据来源
impl<F, I> BatchSource for F
where
    F: FnMut(usize) -> I,
    I: IntoIterator<Item = Result<Batch, DataError>>,
    I::IntoIter: 'static,
{
    fn batches(
        &mut self,
        batch_size: usize,
    ) -> Box<dyn Iterator<Item = Result<Batch, DataError>> + '_> {
        Box::new((*self)(batch_size).into_iter())
    }
}
