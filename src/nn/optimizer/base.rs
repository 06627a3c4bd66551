/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:00:00
 * @Description  : 优化器基础trait和辅助结构
 */

use crate::nn::{GraphError, Var};

/// 优化器核心 trait
pub trait Optimizer {
    /// 参数更新（使用已计算的梯度）
    ///
    /// 训练循环：
    /// ```ignore
    /// optimizer.zero_grad()?;
    /// loss.backward()?;
    /// optimizer.step()?; // ← 只更新参数，不做 forward/backward
    /// ```
    fn step(&mut self) -> Result<(), GraphError>;

    /// 清零参数所在计算图中的全部梯度
    fn zero_grad(&mut self) -> Result<(), GraphError>;

    /// 重置累积状态
    fn reset(&mut self);

    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, lr: f32);
}

/// 优化器状态管理（内部实现，不对外暴露）
#[derive(Debug)]
pub(super) struct OptimizerState {
    /// 需要更新的参数
    params: Vec<Var>,
    learning_rate: f32,
}

impl OptimizerState {
    pub(super) const fn new(params: Vec<Var>, learning_rate: f32) -> Self {
        Self {
            params,
            learning_rate,
        }
    }

    pub(super) fn params(&self) -> &[Var] {
        &self.params
    }

    pub(super) const fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub(super) const fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
