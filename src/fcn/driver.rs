/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 一次完整运行：检查数据集 → 加载骨干网络 → 建立解码器与训练目标 → 训练 → 保存推理样例
 */

use super::{
    Backbone, Decoder, FcnError, Objective, Session, StdoutReporter, TrainStep, TrainSummary,
    save_inference_samples, train_nn,
};
use crate::config::TrainConfig;
use crate::data::{KittiRoadBatches, check_kitti_dataset};
use crate::nn::Module;
use std::path::PathBuf;

const LABELS_NAME: &str = "correct_label";
const CONFIG_FILE: &str = "config.json";
const DECODER_FILE: &str = "decoder.bin";

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub train: TrainSummary,
    /// 推理样例、配置快照（及导出的解码器参数）所在目录
    pub output_dir: PathBuf,
}

pub fn run(config: &TrainConfig) -> Result<RunSummary, FcnError> {
    tracing::info!("road_fcn {}", env!("CARGO_PKG_VERSION"));
    let workers = rayon::current_num_threads();
    if workers <= 1 {
        tracing::warn!("只有1个计算线程可用，训练会非常慢");
    } else {
        tracing::info!("数值计算使用{workers}个线程");
    }

    config.validate()?;
    check_kitti_dataset(&config.data_dir)?;

    let session = Session::with_seed(config.seed);
    let image_shape = config.image_shape();
    let backbone = Backbone::load_with_image_shape(&session, config.vgg_dir(), image_shape)?;
    let decoder = Decoder::build(
        &session,
        &backbone.feature_maps(),
        config.num_classes,
        config.variant,
    )?;
    let labels = session
        .graph()
        .placeholder(decoder.score().value_expected_shape()?, LABELS_NAME)?;
    let objective = Objective::build(
        &session,
        decoder.score(),
        &labels,
        &decoder.parameters(),
        config.learning_rate,
    )?;
    let logits = objective.logits().clone();

    let mut source = KittiRoadBatches::open(config.training_dir(), image_shape)?
        .with_num_classes(config.num_classes)?;
    if let Some(seed) = config.seed {
        source = source.with_seed(seed);
    }
    tracing::info!(
        "开始训练：{}个样本，{}个epoch，每个epoch {}个batch",
        source.len(),
        config.epochs,
        source.num_batches(config.batch_size)
    );
    let mut step = TrainStep::new(&backbone, labels, objective);
    let train = train_nn(
        &mut step,
        &config.hyperparameters(),
        &mut source,
        &mut StdoutReporter,
    )?;

    let output_dir = save_inference_samples(
        &config.runs_dir,
        &config.data_dir,
        image_shape,
        &logits,
        &backbone.keep_prob,
        &backbone.image_input,
    )?;
    config.save_json(output_dir.join(CONFIG_FILE))?;
    if config.export_decoder {
        decoder.save_params(output_dir.join(DECODER_FILE))?;
        tracing::info!("解码器参数已导出到{}", output_dir.join(DECODER_FILE).display());
    }

    drop(session);
    Ok(RunSummary { train, output_dir })
}
