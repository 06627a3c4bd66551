/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 2D卷积节点（不含偏置，偏置由ChannelBiasAdd节点单独承担）
 *                 输入[N, C_in, H, W]，卷积核[C_out, C_in, kH, kW]，输出[N, C_out, H', W']，
 *                 H' = (H + 2·pH - kH) / sH + 1。batch维上用rayon并行。
 */

use super::im2col::{ConvGeometry, col2im, im2col};
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_ndim, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Ix3, stack};
use rayon::prelude::*;

pub(crate) struct Conv2d {
    stride: (usize, usize),
    padding: (usize, usize),
    shape: DynamicShape,
}

impl Conv2d {
    pub(crate) fn new(
        parents: &[&DynamicShape],
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, GraphError> {
        // 1. 必要的验证
        check_parents_count("Conv2d", parents, 2)?;
        let (input, kernel) = (parents[0], parents[1]);
        check_ndim("Conv2d", input, 4)?;
        check_ndim("Conv2d", kernel, 4)?;
        let kernel_shape = kernel.to_vec_fixed().ok_or_else(|| {
            GraphError::InvalidOperation(format!("Conv2d的卷积核形状必须完全确定，实际为{kernel}"))
        })?;
        if stride.0 == 0 || stride.1 == 0 {
            return Err(GraphError::InvalidOperation("Conv2d的步长必须大于0".to_string()));
        }
        if input.dim(1).is_some_and(|c| c != kernel_shape[1]) {
            return Err(GraphError::ShapeMismatch {
                expected: DynamicShape::new(&[None, Some(kernel_shape[1]), None, None]),
                got: input.clone(),
                message: "Conv2d输入的通道数须与卷积核的输入通道数一致".to_string(),
            });
        }

        // 2. 计算输出形状
        let out_dim = |size: Option<usize>, k: usize, s: usize, p: usize| -> Result<Option<usize>, GraphError> {
            match size {
                None => Ok(None),
                Some(size) if size + 2 * p >= k => Ok(Some((size + 2 * p - k) / s + 1)),
                Some(size) => Err(GraphError::InvalidOperation(format!(
                    "Conv2d的输入尺寸{size}（填充{p}）小于卷积核尺寸{k}"
                ))),
            }
        };
        let out_h = out_dim(input.dim(2), kernel_shape[2], stride.0, padding.0)?;
        let out_w = out_dim(input.dim(3), kernel_shape[3], stride.1, padding.1)?;

        Ok(Self {
            stride,
            padding,
            shape: DynamicShape::new(&[input.dim(0), Some(kernel_shape[0]), out_h, out_w]),
        })
    }

    fn geometry(&self, input: &[usize], kernel: &[usize]) -> ConvGeometry {
        let (h, w) = (input[2], input[3]);
        ConvGeometry {
            channels: input[1],
            height: h,
            width: w,
            kernel: (kernel[2], kernel[3]),
            stride: self.stride,
            padding: self.padding,
            out_height: (h + 2 * self.padding.0 - kernel[2]) / self.stride.0 + 1,
            out_width: (w + 2 * self.padding.1 - kernel[3]) / self.stride.1 + 1,
        }
    }
}

/// 卷积核展平为[C_out, C_in·kH·kW]
fn kernel_matrix(kernel: &Tensor) -> Result<ArrayView2<'_, f32>, GraphError> {
    let shape = kernel.shape();
    kernel
        .view()
        .into_shape((shape[0], shape[1] * shape[2] * shape[3]))
        .map_err(|e| GraphError::ComputationError(format!("卷积核展平失败：{e}")))
}

fn sample(tensor: &Tensor, index: usize) -> Result<ArrayView3<'_, f32>, GraphError> {
    tensor
        .view()
        .index_axis_move(Axis(0), index)
        .into_dimensionality::<Ix3>()
        .map_err(|e| GraphError::ComputationError(format!("取batch内样本失败：{e}")))
}

/// 将batch内每个样本的结果重新堆叠为[N, ...]
pub(super) fn stack_samples(samples: &[Array3<f32>]) -> Result<Tensor, GraphError> {
    let views = samples.iter().map(Array3::view).collect::<Vec<_>>();
    let stacked = stack(Axis(0), &views)
        .map_err(|e| GraphError::ComputationError(format!("堆叠batch失败：{e}")))?;
    Ok(Tensor::from_array(stacked.into_dyn()))
}

impl TraitNode for Conv2d {
    fn type_name(&self) -> &'static str {
        "Conv2d"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let (input, kernel) = (parents[0], parents[1]);
        let geometry = self.geometry(input.shape(), kernel.shape());
        let weights = kernel_matrix(kernel)?;
        let out_channels = kernel.shape()[0];

        let samples = (0..input.shape()[0])
            .into_par_iter()
            .map(|n| {
                let cols = im2col(sample(input, n)?, &geometry);
                weights
                    .dot(&cols)
                    .into_shape((out_channels, geometry.out_height, geometry.out_width))
                    .map_err(|e| GraphError::ComputationError(format!("卷积输出变形失败：{e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        stack_samples(&samples)
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let (input, kernel) = (parents[0], parents[1]);
        let geometry = self.geometry(input.shape(), kernel.shape());
        let weights = kernel_matrix(kernel)?;
        let out_channels = kernel.shape()[0];
        let upstream_matrix = |n: usize| -> Result<Array2<f32>, GraphError> {
            sample(upstream_grad, n)?
                .to_owned()
                .into_shape((out_channels, geometry.col_cols()))
                .map_err(|e| GraphError::ComputationError(format!("上游梯度变形失败：{e}")))
        };

        match parent_index {
            // 对输入：col2im(Wᵀ · dY)
            0 => {
                let samples = (0..input.shape()[0])
                    .into_par_iter()
                    .map(|n| -> Result<_, GraphError> {
                        let col_grad = weights.t().dot(&upstream_matrix(n)?);
                        Ok(col2im(col_grad.view(), &geometry))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                stack_samples(&samples)
            }
            // 对卷积核：Σₙ dYₙ · im2col(Xₙ)ᵀ
            1 => {
                let grad = (0..input.shape()[0])
                    .into_par_iter()
                    .map(|n| -> Result<Array2<f32>, GraphError> {
                        let cols = im2col(sample(input, n)?, &geometry);
                        Ok(upstream_matrix(n)?.dot(&cols.t()))
                    })
                    .try_reduce(
                        || Array2::zeros((out_channels, geometry.col_rows())),
                        |a, b| Ok(a + b),
                    )?;
                let grad = grad
                    .into_shape(kernel.shape())
                    .map_err(|e| GraphError::ComputationError(format!("卷积核梯度变形失败：{e}")))?;
                Ok(Tensor::from_array(grad.into_dyn()))
            }
            _ => Err(parent_index_error(self.type_name(), parent_index)),
        }
    }
}
