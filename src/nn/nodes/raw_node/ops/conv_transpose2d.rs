/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 2D转置卷积节点（"same"模式，不含偏置）
 *                 输入[N, C_in, H, W]，卷积核[C_in, C_out, kH, kW]，输出[N, C_out, H·sH, W·sW]。
 *                 等价于完整转置卷积的结果在上、左两侧各裁掉(k - s) / 2后取前H·s行、W·s列，要求k ≥ s。
 */

use super::conv2d::stack_samples;
use super::im2col::{ConvGeometry, col2im, im2col};
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_ndim, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use ndarray::{Array2, ArrayView2, Axis, Ix3};
use rayon::prelude::*;

pub(crate) struct ConvTranspose2d {
    stride: (usize, usize),
    shape: DynamicShape,
}

impl ConvTranspose2d {
    pub(crate) fn new(parents: &[&DynamicShape], stride: (usize, usize)) -> Result<Self, GraphError> {
        // 1. 必要的验证
        check_parents_count("ConvTranspose2d", parents, 2)?;
        let (input, kernel) = (parents[0], parents[1]);
        check_ndim("ConvTranspose2d", input, 4)?;
        check_ndim("ConvTranspose2d", kernel, 4)?;
        let kernel_shape = kernel.to_vec_fixed().ok_or_else(|| {
            GraphError::InvalidOperation(format!(
                "ConvTranspose2d的卷积核形状必须完全确定，实际为{kernel}"
            ))
        })?;
        if stride.0 == 0 || stride.1 == 0 {
            return Err(GraphError::InvalidOperation(
                "ConvTranspose2d的步长必须大于0".to_string(),
            ));
        }
        if kernel_shape[2] < stride.0 || kernel_shape[3] < stride.1 {
            return Err(GraphError::InvalidOperation(format!(
                "same模式的转置卷积要求卷积核尺寸不小于步长，实际卷积核为{}x{}，步长为{:?}",
                kernel_shape[2], kernel_shape[3], stride
            )));
        }
        if input.dim(1).is_some_and(|c| c != kernel_shape[0]) {
            return Err(GraphError::ShapeMismatch {
                expected: DynamicShape::new(&[None, Some(kernel_shape[0]), None, None]),
                got: input.clone(),
                message: "ConvTranspose2d输入的通道数须与卷积核的输入通道数一致".to_string(),
            });
        }

        // 2. 输出形状：空间维度放大stride倍
        Ok(Self {
            stride,
            shape: DynamicShape::new(&[
                input.dim(0),
                Some(kernel_shape[1]),
                input.dim(2).map(|h| h * stride.0),
                input.dim(3).map(|w| w * stride.1),
            ]),
        })
    }

    /// 图像侧为输出，列侧为输入
    fn geometry(&self, input: &[usize], kernel: &[usize]) -> ConvGeometry {
        let (kh, kw) = (kernel[2], kernel[3]);
        ConvGeometry {
            channels: kernel[1],
            height: input[2] * self.stride.0,
            width: input[3] * self.stride.1,
            kernel: (kh, kw),
            stride: self.stride,
            padding: ((kh - self.stride.0) / 2, (kw - self.stride.1) / 2),
            out_height: input[2],
            out_width: input[3],
        }
    }
}

/// 卷积核展平为[C_in, C_out·kH·kW]
fn kernel_matrix(kernel: &Tensor) -> Result<ArrayView2<'_, f32>, GraphError> {
    let shape = kernel.shape();
    kernel
        .view()
        .into_shape((shape[0], shape[1] * shape[2] * shape[3]))
        .map_err(|e| GraphError::ComputationError(format!("卷积核展平失败：{e}")))
}

/// batch内第`index`个样本展平为[C, H·W]
fn sample_matrix(tensor: &Tensor, index: usize) -> Result<Array2<f32>, GraphError> {
    let shape = tensor.shape();
    tensor
        .view()
        .index_axis_move(Axis(0), index)
        .to_owned()
        .into_shape((shape[1], shape[2] * shape[3]))
        .map_err(|e| GraphError::ComputationError(format!("取batch内样本失败：{e}")))
}

impl TraitNode for ConvTranspose2d {
    fn type_name(&self) -> &'static str {
        "ConvTranspose2d"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let (input, kernel) = (parents[0], parents[1]);
        let geometry = self.geometry(input.shape(), kernel.shape());
        let weights = kernel_matrix(kernel)?;

        // 输出 = col2im(Wᵀ · X)
        let samples = (0..input.shape()[0])
            .into_par_iter()
            .map(|n| -> Result<_, GraphError> {
                let cols = weights.t().dot(&sample_matrix(input, n)?);
                Ok(col2im(cols.view(), &geometry))
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
        let upstream_cols = |n: usize| -> Result<Array2<f32>, GraphError> {
            let image = upstream_grad
                .view()
                .index_axis_move(Axis(0), n)
                .into_dimensionality::<Ix3>()
                .map_err(|e| GraphError::ComputationError(format!("取batch内样本失败：{e}")))?;
            Ok(im2col(image, &geometry))
        };

        match parent_index {
            // 对输入：W · im2col(dY)，即以同一卷积核对上游梯度做普通卷积
            0 => {
                let in_shape = input.shape();
                let samples = (0..in_shape[0])
                    .into_par_iter()
                    .map(|n| {
                        weights
                            .dot(&upstream_cols(n)?)
                            .into_shape((in_shape[1], in_shape[2], in_shape[3]))
                            .map_err(|e| {
                                GraphError::ComputationError(format!("输入梯度变形失败：{e}"))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                stack_samples(&samples)
            }
            // 对卷积核：Σₙ Xₙ · im2col(dYₙ)ᵀ
            1 => {
                let grad = (0..input.shape()[0])
                    .into_par_iter()
                    .map(|n| -> Result<Array2<f32>, GraphError> {
                        Ok(sample_matrix(input, n)?.dot(&upstream_cols(n)?.t()))
                    })
                    .try_reduce(
                        || Array2::zeros((kernel.shape()[0], geometry.col_rows())),
                        |a, b| Ok(a + b),
                    )?;
                let grad = grad.into_shape(kernel.shape()).map_err(|e| {
                    GraphError::ComputationError(format!("卷积核梯度变形失败：{e}"))
                })?;
                Ok(Tensor::from_array(grad.into_dyn()))
            }
            _ => Err(parent_index_error(self.type_name(), parent_index)),
        }
    }
}
