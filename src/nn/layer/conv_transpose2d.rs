/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : ConvTranspose2d (2D 转置卷积，"same"模式) 层
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, out_channels, H·stride_h, W·stride_w]
 *
 * 计算：output = conv_transpose2d(x, K) + b，要求 kernel ≥ stride
 */

use crate::nn::{Graph, GraphError, Init, Module, Var};

#[derive(Debug)]
pub struct ConvTranspose2d {
    /// 卷积核参数 [in_channels, out_channels, kernel_h, kernel_w]
    kernel: Var,
    /// 偏置参数 [1, out_channels]
    bias: Var,
    stride: (usize, usize),
}

impl ConvTranspose2d {
    /// 创建新的可训练 ConvTranspose2d 层：卷积核按`init`初始化，偏置零初始化
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        let (k_h, k_w) = kernel_size;
        if k_h < stride.0 || k_w < stride.1 {
            return Err(GraphError::InvalidOperation(format!(
                "{name}：same模式的转置卷积要求卷积核{kernel_size:?}不小于步长{stride:?}"
            )));
        }
        let kernel = graph.parameter(
            &[in_channels, out_channels, k_h, k_w],
            init,
            &format!("{name}_K"),
        )?;
        let bias = graph.parameter(&[1, out_channels], Init::Zeros, &format!("{name}_b"))?;
        Ok(Self {
            kernel,
            bias,
            stride,
        })
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        x.conv_transpose2d(&self.kernel, self.stride)?
            .channel_bias_add(&self.bias)
    }

    pub const fn kernel(&self) -> &Var {
        &self.kernel
    }
}

impl Module for ConvTranspose2d {
    fn parameters(&self) -> Vec<Var> {
        vec![self.kernel.clone(), self.bias.clone()]
    }
}
