mod backbone;
mod inference;

use crate::data::Batch;
use crate::fcn::{
    Backbone, BackboneArch, Decoder, DecoderVariant, Objective, Session, write_random_checkpoint,
};
use crate::nn::{Module, Var};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

/// 与`BackboneArch::tiny()`配合的输入尺寸（32的整数倍）
pub(super) const IMAGE_SHAPE: (usize, usize) = (32, 64);

/// 在`dir/vgg`写出一个随机权重的迷你骨干网络
pub(super) fn tiny_checkpoint(dir: &Path) -> PathBuf {
    let path = dir.join("vgg");
    write_random_checkpoint(&path, &BackboneArch::tiny(), 5).unwrap();
    path
}

/// 随机图像与随机的两类（或多类）one-hot标签
pub(super) fn random_batch(batch_size: usize, num_classes: usize, seed: u64) -> Batch {
    let (h, w) = IMAGE_SHAPE;
    let mut rng = StdRng::seed_from_u64(seed);
    let images = Tensor::uniform_with_rng(0.0, 1.0, &[batch_size, 3, h, w], &mut rng);
    let mut labels = Tensor::zeros(&[batch_size, num_classes, h, w]);
    for n in 0..batch_size {
        for y in 0..h {
            for x in 0..w {
                let class = rng.gen_range(0..num_classes);
                labels[[n, class, y, x]] = 1.0;
            }
        }
    }
    Batch::new(images, labels).unwrap()
}

/// 骨干网络 + 解码器 + 训练目标
pub(super) struct Pipeline {
    pub backbone: Backbone,
    pub decoder: Decoder,
    pub labels: Var,
    pub objective: Objective,
}

pub(super) fn build_pipeline(
    session: &Session,
    checkpoint: &Path,
    num_classes: usize,
    variant: DecoderVariant,
    learning_rate: f32,
) -> Pipeline {
    let backbone = Backbone::load_with_image_shape(session, checkpoint, IMAGE_SHAPE).unwrap();
    let decoder = Decoder::build(session, &backbone.feature_maps(), num_classes, variant).unwrap();
    let labels = session
        .graph()
        .placeholder(decoder.score().value_expected_shape().unwrap(), "correct_label")
        .unwrap();
    let objective = Objective::build(
        session,
        decoder.score(),
        &labels,
        &decoder.parameters(),
        learning_rate,
    )
    .unwrap();
    Pipeline {
        backbone,
        decoder,
        labels,
        objective,
    }
}
