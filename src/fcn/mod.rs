/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 全卷积网络（FCN）道路分割：在冻结的预训练VGG骨干网络之上训练一个上采样解码器。
 *
 * 数据流：图像/标签batch → 骨干网络（冻结） → 解码器（可训练） → 训练目标（损失 + Adam）→ 推理样例
 */

mod backbone;
mod decoder;
mod driver;
mod error;
mod inference;
mod objective;
mod session;
mod trainer;

#[cfg(test)]
mod tests;

pub use backbone::{
    Backbone, BackboneArch, FeatureMaps, MIN_SAVED_MODEL_VERSION, SAVED_MODEL_VERSION,
    SavedModelMeta, VGG_TAG, read_variables, write_random_checkpoint,
};
pub use decoder::{Decoder, DecoderVariant};
pub use driver::{RunSummary, run};
pub use error::FcnError;
pub use inference::{ROAD_CLASS, class_probability, save_inference_samples};
pub use objective::Objective;
pub use session::Session;
pub use trainer::{
    Hyperparameters, ProgressReporter, StdoutReporter, TrainStep, TrainSummary, train_nn,
};
