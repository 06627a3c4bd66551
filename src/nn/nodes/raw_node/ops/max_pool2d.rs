/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 2D最大池化节点（无填充，尺寸不足一个窗口的边缘被丢弃）
 *                 前向时记录每个窗口最大值在输入中的位置，反向时梯度只流向该位置。
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_ndim, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;

pub(crate) struct MaxPool2d {
    kernel: (usize, usize),
    stride: (usize, usize),
    shape: DynamicShape,
    /// 最近一次前向传播中，每个输出元素对应的输入元素（展平后的）下标
    argmax: Option<Vec<usize>>,
}

impl MaxPool2d {
    pub(crate) fn new(
        parents: &[&DynamicShape],
        kernel: (usize, usize),
        stride: (usize, usize),
    ) -> Result<Self, GraphError> {
        check_parents_count("MaxPool2d", parents, 1)?;
        let input = parents[0];
        check_ndim("MaxPool2d", input, 4)?;
        if kernel.0 == 0 || kernel.1 == 0 || stride.0 == 0 || stride.1 == 0 {
            return Err(GraphError::InvalidOperation(
                "MaxPool2d的窗口与步长都必须大于0".to_string(),
            ));
        }
        let out_dim = |size: Option<usize>, k: usize, s: usize| -> Result<Option<usize>, GraphError> {
            match size {
                Some(size) if size < k => Err(GraphError::InvalidOperation(format!(
                    "MaxPool2d的输入尺寸{size}小于窗口尺寸{k}"
                ))),
                size => Ok(size.map(|size| (size - k) / s + 1)),
            }
        };
        Ok(Self {
            kernel,
            stride,
            shape: DynamicShape::new(&[
                input.dim(0),
                input.dim(1),
                out_dim(input.dim(2), kernel.0, stride.0)?,
                out_dim(input.dim(3), kernel.1, stride.1)?,
            ]),
            argmax: None,
        })
    }

    const fn out_size(&self, h: usize, w: usize) -> (usize, usize) {
        (
            (h - self.kernel.0) / self.stride.0 + 1,
            (w - self.kernel.1) / self.stride.1 + 1,
        )
    }
}

impl TraitNode for MaxPool2d {
    fn type_name(&self) -> &'static str {
        "MaxPool2d"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let input = parents[0];
        let [n, c, h, w] = [0, 1, 2, 3].map(|i| input.shape()[i]);
        let (out_h, out_w) = self.out_size(h, w);
        let data = input.data_as_slice();

        let mut output = Vec::with_capacity(n * c * out_h * out_w);
        let mut argmax = Vec::with_capacity(n * c * out_h * out_w);
        for plane in 0..n * c {
            let base = plane * h * w;
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut best = base + oy * self.stride.0 * w + ox * self.stride.1;
                    for ky in 0..self.kernel.0 {
                        for kx in 0..self.kernel.1 {
                            let index =
                                base + (oy * self.stride.0 + ky) * w + ox * self.stride.1 + kx;
                            if data[index] > data[best] {
                                best = index;
                            }
                        }
                    }
                    output.push(data[best]);
                    argmax.push(best);
                }
            }
        }
        self.argmax = Some(argmax);
        Tensor::try_new(output, &[n, c, out_h, out_w])
            .map_err(|e| GraphError::ComputationError(e.to_string()))
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(parent_index_error(self.type_name(), parent_index));
        }
        let argmax = self.argmax.as_ref().ok_or_else(|| {
            GraphError::ComputationError("MaxPool2d节点尚未执行前向传播".to_string())
        })?;
        let mut grad = Tensor::zeros(parents[0].shape());
        let grad_data = grad.data_as_slice_mut();
        for (&index, &g) in argmax.iter().zip(upstream_grad.data_as_slice()) {
            grad_data[index] += g;
        }
        Ok(grad)
    }
}
