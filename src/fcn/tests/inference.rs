use super::{IMAGE_SHAPE, build_pipeline, tiny_checkpoint};
use crate::data::{Batch, DataError};
use crate::fcn::{
    DecoderVariant, FcnError, Hyperparameters, ROAD_CLASS, Session, StdoutReporter, TrainStep,
    class_probability, read_variables, save_inference_samples, train_nn,
};
use crate::nn::GraphError;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use image::{Rgb, RgbImage};
use std::path::Path;

/// 只写出测试集图像（推理不需要训练集）
fn write_testing_images(data_dir: &Path, names: &[&str], width: u32, height: u32) {
    let testing = data_dir.join("data_road").join("testing").join("image_2");
    std::fs::create_dir_all(&testing).unwrap();
    for name in names {
        RgbImage::from_pixel(width, height, Rgb([90, 120, 30]))
            .save(testing.join(format!("{name}.png")))
            .unwrap();
    }
}

#[test]
fn test_class_probability_is_pixelwise_softmax() {
    // 2x2图像、2个类别
    let logits = Tensor::new(&[0.0, 0.0, 0.0, 2.0, 3.0, 0.0, -1.0, 1.0], &[4, 2]);
    let road = class_probability(&logits, (2, 2), ROAD_CLASS).unwrap();
    assert_eq!(road.shape(), &[2, 2]);
    assert_abs_diff_eq!(road[[0, 0]], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(road[[0, 1]], 1.0 / (1.0 + (-2.0f32).exp()), epsilon = 1e-6);
    assert_abs_diff_eq!(road[[1, 0]], 1.0 / (1.0 + 3.0f32.exp()), epsilon = 1e-6);
    assert_abs_diff_eq!(road[[1, 1]], 1.0 / (1.0 + (-2.0f32).exp()), epsilon = 1e-6);

    let background = class_probability(&logits, (2, 2), 0).unwrap();
    for y in 0..2 {
        for x in 0..2 {
            assert_abs_diff_eq!(road[[y, x]] + background[[y, x]], 1.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_class_probability_is_stable_for_large_logits() {
    let logits = Tensor::new(&[1000.0, 1001.0], &[1, 2]);
    let road = class_probability(&logits, (1, 1), ROAD_CLASS).unwrap();
    assert!(road[[0, 0]].is_finite());
    assert_abs_diff_eq!(road[[0, 0]], 1.0 / (1.0 + (-1.0f32).exp()), epsilon = 1e-5);
}

#[test]
fn test_class_probability_rejects_mismatched_logits() {
    let logits = Tensor::zeros(&[6, 2]);
    assert!(matches!(
        class_probability(&logits, (2, 2), ROAD_CLASS),
        Err(FcnError::Graph(GraphError::ShapeMismatch { .. }))
    ));
    assert!(matches!(
        class_probability(&Tensor::zeros(&[4, 2]), (2, 2), 2),
        Err(FcnError::Graph(GraphError::ShapeMismatch { .. }))
    ));
    assert!(matches!(
        class_probability(&Tensor::zeros(&[1, 4, 2]), (2, 2), ROAD_CLASS),
        Err(FcnError::Graph(GraphError::ShapeMismatch { .. }))
    ));
}

#[test]
fn test_untrained_inference_keeps_backbone_weights() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = tiny_checkpoint(dir.path());
    let data_dir = dir.path().join("data");
    // 与输入尺寸不同，推理前会被缩放
    write_testing_images(&data_dir, &["um_000000", "umm_000003"], 70, 40);

    let session = Session::with_seed(Some(3));
    let pipeline = build_pipeline(&session, &checkpoint, 2, DecoderVariant::FullDepth, 1e-4);
    let logits = pipeline.objective.logits().clone();
    let image_input = pipeline.backbone.image_input.clone();
    let keep_prob = pipeline.backbone.keep_prob.clone();
    let mut step = TrainStep::new(&pipeline.backbone, pipeline.labels, pipeline.objective);

    let hyper = Hyperparameters {
        epochs: 0,
        batch_size: 1,
        learning_rate: 1e-4,
        keep_prob: 0.5,
    };
    let mut source = |_: usize| -> Vec<Result<Batch, DataError>> { Vec::new() };
    let summary = train_nn(&mut step, &hyper, &mut source, &mut StdoutReporter).unwrap();
    assert_eq!(summary.steps, 0);

    let output_dir = save_inference_samples(
        dir.path().join("runs"),
        &data_dir,
        IMAGE_SHAPE,
        &logits,
        &keep_prob,
        &image_input,
    )
    .unwrap();
    assert!(output_dir.starts_with(dir.path().join("runs")));
    for name in ["um_000000.png", "umm_000003.png"] {
        let overlay = image::open(output_dir.join(name)).unwrap().to_rgb8();
        assert_eq!(overlay.dimensions(), (IMAGE_SHAPE.1 as u32, IMAGE_SHAPE.0 as u32));
    }

    let loaded = read_variables(&checkpoint).unwrap();
    assert_eq!(pipeline.backbone.snapshot().unwrap(), loaded);
}

#[test]
fn test_inference_without_testing_images_fails() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = tiny_checkpoint(dir.path());
    let session = Session::new();
    let pipeline = build_pipeline(&session, &checkpoint, 2, DecoderVariant::FullDepth, 1e-4);

    let result = save_inference_samples(
        dir.path().join("runs"),
        dir.path().join("missing"),
        IMAGE_SHAPE,
        pipeline.objective.logits(),
        &pipeline.backbone.keep_prob,
        &pipeline.backbone.image_input,
    );
    assert!(matches!(result, Err(FcnError::Data(_))));
}
