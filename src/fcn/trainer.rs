/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 训练循环：epochs × batches，每个batch做一次优化并汇报进度。
 *                 没有提前停止、验证、中途检查点与重试，任何一步出错都直接终止训练。
 */

use super::{Backbone, FcnError, Objective};
use crate::data::{Batch, BatchSource};
use crate::nn::Var;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// 训练超参数（整个运行期间不变）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub keep_prob: f32,
}

/// 训练进度汇报
pub trait ProgressReporter {
    fn report(&mut self, epoch: usize, batch_index: usize, loss: f32);
}

impl<F: FnMut(usize, usize, f32)> ProgressReporter for F {
    fn report(&mut self, epoch: usize, batch_index: usize, loss: f32) {
        (*self)(epoch, batch_index, loss);
    }
}

/// 把进度逐行打印到标准输出
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl ProgressReporter for StdoutReporter {
    fn report(&mut self, epoch: usize, batch_index: usize, loss: f32) {
        println!("Epoch: {epoch}, batch number: {batch_index}, cost: {loss:.3}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrainSummary {
    /// 执行的优化步数
    pub steps: usize,
    pub last_loss: Option<f32>,
}

/// 单步训练：把一个batch喂给图的输入，再执行一次优化
pub struct TrainStep {
    image_input: Var,
    keep_prob: Var,
    labels: Var,
    objective: Objective,
}

impl TrainStep {
    pub fn new(backbone: &Backbone, labels: Var, objective: Objective) -> Self {
        Self {
            image_input: backbone.image_input.clone(),
            keep_prob: backbone.keep_prob.clone(),
            labels,
            objective,
        }
    }

    pub const fn objective(&self) -> &Objective {
        &self.objective
    }

    /// 只喂入数据，不做计算
    pub fn feed(&self, batch: &Batch, keep_prob: f32) -> Result<(), FcnError> {
        self.image_input.feed(&batch.images)?;
        self.labels.feed(&batch.labels)?;
        self.keep_prob.feed(&Tensor::new(&[keep_prob], &[1, 1]))?;
        Ok(())
    }

    pub fn run(&mut self, batch: &Batch, learning_rate: f32, keep_prob: f32) -> Result<f32, FcnError> {
        self.feed(batch, keep_prob)?;
        self.image_input.get_graph().train();
        Ok(self.objective.step(learning_rate)?)
    }
}

/// 训练循环
pub fn train_nn(
    step: &mut TrainStep,
    hyper: &Hyperparameters,
    source: &mut impl BatchSource,
    reporter: &mut impl ProgressReporter,
) -> Result<TrainSummary, FcnError> {
    let mut summary = TrainSummary::default();
    for epoch in 0..hyper.epochs {
        let mut epoch_loss = 0.0;
        let mut epoch_batches = 0;
        for (batch_index, batch) in source.batches(hyper.batch_size).enumerate() {
            let loss = step.run(&batch?, hyper.learning_rate, hyper.keep_prob)?;
            reporter.report(epoch, batch_index, loss);
            summary.steps += 1;
            summary.last_loss = Some(loss);
            epoch_loss += loss;
            epoch_batches += 1;
        }
        if epoch_batches > 0 {
            tracing::info!(
                "第{epoch}个epoch结束：{epoch_batches}个batch，平均损失{:.4}",
                epoch_loss / epoch_batches as f32
            );
        } else {
            tracing::warn!("第{epoch}个epoch没有任何batch");
        }
    }
    Ok(summary)
}
