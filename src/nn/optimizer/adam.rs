/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:30:00
 * @Description  : Adam优化器实现
 */

use super::base::{Optimizer, OptimizerState};
use crate::nn::{GraphError, NodeId, Var};
use crate::tensor::Tensor;
use std::collections::HashMap;

/// Adam优化器：只更新构造时给定的参数组（如仅解码器的权重）
#[derive(Debug)]
pub struct Adam {
    state: OptimizerState,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    /// 一阶矩估计
    m: HashMap<NodeId, Tensor>,
    /// 二阶矩估计
    v: HashMap<NodeId, Tensor>,
    /// 时间步
    t: usize,
}

impl Adam {
    /// 使用指定超参数创建Adam优化器
    pub fn new(params: &[Var], learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            state: OptimizerState::new(params.to_vec(), learning_rate),
            beta1,
            beta2,
            epsilon,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }

    /// 使用默认超参数（β1 = 0.9，β2 = 0.999，ε = 1e-8）创建Adam优化器
    pub fn new_default(params: &[Var], learning_rate: f32) -> Self {
        Self::new(params, learning_rate, 0.9, 0.999, 1e-8)
    }

    /// 已执行的更新步数
    pub const fn steps(&self) -> usize {
        self.t
    }

    /// Adam 参数更新的核心逻辑
    fn update_with_gradient(&mut self, param: &Var, gradient: &Tensor) -> Result<(), GraphError> {
        let node_id = param.node_id();
        let current_value = param.value()?.ok_or_else(|| {
            GraphError::ComputationError(format!("参数{node_id}没有值"))
        })?;

        // 原地更新一阶矩估计: m = β1 * m + (1 - β1) * g
        let m = self
            .m
            .entry(node_id)
            .or_insert_with(|| Tensor::zeros(gradient.shape()));
        *m *= self.beta1;
        *m += &(gradient * (1.0 - self.beta1));

        // 原地更新二阶矩估计: v = β2 * v + (1 - β2) * g²
        let v = self
            .v
            .entry(node_id)
            .or_insert_with(|| Tensor::zeros(gradient.shape()));
        *v *= self.beta2;
        *v += &(&(gradient * gradient) * (1.0 - self.beta2));

        // 偏差修正
        let m_hat = &*m / (1.0 - self.beta1.powi(self.t as i32));
        let v_hat = &*v / (1.0 - self.beta2.powi(self.t as i32));

        // 参数更新: θ = θ - α * m_hat / (√v_hat + ε)
        let update = &m_hat / &(v_hat.sqrt() + self.epsilon);
        let new_value = &current_value - &(&update * self.state.learning_rate());
        param.feed(&new_value)
    }
}

impl Optimizer for Adam {
    fn step(&mut self) -> Result<(), GraphError> {
        self.t += 1;
        // 先收集所有参数及其梯度（避免借用冲突）；本步没有梯度的参数不更新
        let gradients = self
            .state
            .params()
            .iter()
            .map(|param| Ok(param.grad()?.map(|g| (param.clone(), g))))
            .collect::<Result<Vec<_>, GraphError>>()?;
        for (param, gradient) in gradients.into_iter().flatten() {
            self.update_with_gradient(&param, &gradient)?;
        }
        Ok(())
    }

    fn zero_grad(&mut self) -> Result<(), GraphError> {
        if let Some(first) = self.state.params().first() {
            first.get_graph().zero_grad();
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }

    fn learning_rate(&self) -> f32 {
        self.state.learning_rate()
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.state.set_learning_rate(lr);
    }
}
