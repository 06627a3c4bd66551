/*
 * @Author       : 老董
 * @Date         : 2025-12-22
 * @Description  : Conv2d (2D 卷积) 层
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, out_channels, H', W']
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding_h - kernel_h) / stride_h + 1
 * W' = (W + 2*padding_w - kernel_w) / stride_w + 1
 *
 * 计算：output = conv2d(x, K) + b
 */

use crate::nn::{Graph, GraphError, Init, Module, Var};
use crate::tensor::Tensor;

/// Conv2d (2D 卷积) 层：`output = conv2d(x, K) + b`
///
/// # 使用示例
/// ```ignore
/// let conv = Conv2d::new(&graph, 3, 64, (3, 3), (1, 1), (1, 1), true, init, "conv1_1")?;
/// let h = conv.forward(&x)?.relu()?;
/// ```
#[derive(Debug)]
pub struct Conv2d {
    /// 卷积核参数 [out_channels, in_channels, kernel_h, kernel_w]
    kernel: Var,
    /// 偏置参数 [1, out_channels]（可选）
    bias: Option<Var>,
    stride: (usize, usize),
    padding: (usize, usize),
}

impl Conv2d {
    /// 创建新的可训练 Conv2d 层：卷积核按`init`初始化，偏置零初始化
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        use_bias: bool,
        init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        let (k_h, k_w) = kernel_size;
        let kernel = graph.parameter(
            &[out_channels, in_channels, k_h, k_w],
            init,
            &format!("{name}_K"),
        )?;
        let bias = if use_bias {
            Some(graph.parameter(&[1, out_channels], Init::Zeros, &format!("{name}_b"))?)
        } else {
            None
        };
        Ok(Self {
            kernel,
            bias,
            stride,
            padding,
        })
    }

    /// 用已有权重创建冻结（不可训练）的 Conv2d 层，如加载的预训练骨干网络
    pub fn frozen(
        graph: &Graph,
        kernel: &Tensor,
        bias: Option<&Tensor>,
        stride: (usize, usize),
        padding: (usize, usize),
        name: &str,
    ) -> Result<Self, GraphError> {
        let kernel = graph.frozen_parameter(kernel, &format!("{name}_K"))?;
        let bias = bias
            .map(|b| graph.frozen_parameter(b, &format!("{name}_b")))
            .transpose()?;
        Ok(Self {
            kernel,
            bias,
            stride,
            padding,
        })
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let output = x.conv2d(&self.kernel, self.stride, self.padding)?;
        match &self.bias {
            Some(bias) => output.channel_bias_add(bias),
            None => Ok(output),
        }
    }

    pub const fn kernel(&self) -> &Var {
        &self.kernel
    }

    pub const fn bias(&self) -> Option<&Var> {
        self.bias.as_ref()
    }
}

impl Module for Conv2d {
    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.kernel.clone()];
        params.extend(self.bias.clone());
        params
    }
}
