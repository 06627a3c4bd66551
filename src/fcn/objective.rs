/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 训练目标：得分图与标签都展平为[像素数, 类别数]，
 *                 以数值稳定的softmax交叉熵的均值为损失，用Adam只更新给定的（解码器）参数。
 */

use super::Session;
use crate::nn::optimizer::{Adam, Optimizer};
use crate::nn::{GraphError, Var};

#[derive(Debug)]
pub struct Objective {
    logits: Var,
    loss: Var,
    optimizer: Adam,
}

impl Objective {
    /// `score`为[N, C, H, W]得分图，`labels`为同形状的one-hot标签
    pub fn build(
        session: &Session,
        score: &Var,
        labels: &Var,
        parameters: &[Var],
        learning_rate: f32,
    ) -> Result<Self, GraphError> {
        let score_shape = score.value_expected_shape()?;
        let label_shape = labels.value_expected_shape()?;
        if score_shape != label_shape {
            return Err(GraphError::ShapeMismatch {
                expected: score_shape,
                got: label_shape,
                message: "标签的形状须与得分图一致".to_string(),
            });
        }
        let graph = session.graph();
        if !score.same_graph(&graph.wrap_node_id(score.node_id())) {
            return Err(GraphError::InvalidOperation(
                "得分图不属于本会话的计算图".to_string(),
            ));
        }

        let logits = score.flatten_pixels()?;
        let loss = logits.softmax_cross_entropy(&labels.flatten_pixels()?)?;
        Ok(Self {
            logits,
            loss,
            optimizer: Adam::new_default(parameters, learning_rate),
        })
    }

    /// [N·H·W, C]
    pub const fn logits(&self) -> &Var {
        &self.logits
    }

    pub const fn loss(&self) -> &Var {
        &self.loss
    }

    pub const fn optimizer(&self) -> &Adam {
        &self.optimizer
    }

    /// 一次优化：清零梯度、前向、反向、Adam更新。返回本步（更新前）的损失
    pub fn step(&mut self, learning_rate: f32) -> Result<f32, GraphError> {
        self.optimizer.set_learning_rate(learning_rate);
        self.optimizer.zero_grad()?;
        let loss = self.loss.backward()?;
        self.optimizer.step()?;
        Ok(loss)
    }

    /// 只做前向传播（评估模式，dropout关闭），返回损失
    pub fn evaluate(&self) -> Result<f32, GraphError> {
        self.loss.get_graph().no_grad_scope(|_| {
            self.loss.forward()?;
            self.loss
                .value()?
                .and_then(|loss| loss.number())
                .ok_or_else(|| GraphError::ComputationError("损失没有值".to_string()))
        })
    }
}
