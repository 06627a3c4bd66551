/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 端到端测试：在迷你KITTI road数据集与迷你骨干网络上完整跑一次训练与推理，
 *                 以及配置文件与命令行参数的合并规则
 */
use road_fcn::config::TrainConfig;
use road_fcn::fcn::{self, BackboneArch, DecoderVariant, FcnError, write_random_checkpoint};
use road_fcn::nn::ParamsFile;
use std::path::Path;

use image::{Rgb, RgbImage};

/// 写出`data_dir/data_road`（训练集图像、道路标注与测试集图像）及`data_dir/vgg`
fn write_mini_dataset(data_dir: &Path, names: &[&str], width: u32, height: u32) {
    let training = data_dir.join("data_road").join("training");
    let testing = data_dir.join("data_road").join("testing").join("image_2");
    for dir in [
        training.join("image_2"),
        training.join("gt_image_2"),
        testing.clone(),
    ] {
        std::fs::create_dir_all(dir).unwrap();
    }
    for (i, name) in names.iter().enumerate() {
        let shade = (i as u8).wrapping_mul(60);
        let image = RgbImage::from_pixel(width, height, Rgb([shade, 100, 200]));
        image
            .save(training.join("image_2").join(format!("{name}.png")))
            .unwrap();
        image.save(testing.join(format!("{name}.png"))).unwrap();

        // 下半部分为道路（品红），其余为背景（红）
        let label = RgbImage::from_fn(width, height, |_, y| {
            if y >= height / 2 {
                Rgb([255, 0, 255])
            } else {
                Rgb([255, 0, 0])
            }
        });
        let (prefix, number) = name.split_once('_').unwrap();
        label
            .save(
                training
                    .join("gt_image_2")
                    .join(format!("{prefix}_road_{number}.png")),
            )
            .unwrap();
    }
    write_random_checkpoint(data_dir.join("vgg"), &BackboneArch::tiny(), 11).unwrap();
}

#[test]
fn test_full_run_on_mini_kitti() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let runs_dir = dir.path().join("runs");
    let names = ["um_000000", "umm_000001", "uu_000002"];
    write_mini_dataset(&data_dir, &names, 70, 40);

    let config = TrainConfig::try_from_args([
        "train",
        "--epochs",
        "2",
        "--batch-size",
        "2",
        "--image-height",
        "32",
        "--image-width",
        "64",
        "--seed",
        "42",
        "--data-dir",
        data_dir.to_str().unwrap(),
        "--runs-dir",
        runs_dir.to_str().unwrap(),
        "--export-decoder",
    ])
    .unwrap();
    assert_eq!(config.variant, DecoderVariant::FullDepth);

    let summary = fcn::run(&config).unwrap();
    // 3个样本、batch为2：每个epoch 2个batch
    assert_eq!(summary.train.steps, 4);
    assert!(summary.train.last_loss.unwrap().is_finite());
    assert!(summary.output_dir.starts_with(&runs_dir));

    for name in names {
        let overlay = image::open(summary.output_dir.join(format!("{name}.png")))
            .unwrap()
            .to_rgb8();
        assert_eq!(overlay.dimensions(), (64, 32));
    }
    let saved = TrainConfig::load_json(summary.output_dir.join("config.json")).unwrap();
    assert_eq!(saved, config);
    let decoder = ParamsFile::load(summary.output_dir.join("decoder.bin")).unwrap();
    assert!(!decoder.entries.is_empty());
    assert!(
        decoder
            .entries
            .iter()
            .all(|(name, _)| name.starts_with("decoder_"))
    );
}

#[test]
fn test_run_stops_before_training_without_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainConfig {
        epochs: 1,
        image_height: 32,
        image_width: 64,
        data_dir: dir.path().join("nowhere"),
        runs_dir: dir.path().join("runs"),
        ..TrainConfig::default()
    };
    assert!(matches!(fcn::run(&config), Err(FcnError::Data(_))));
    assert!(!dir.path().join("runs").exists());
}

#[test]
fn test_run_rejects_invalid_config() {
    let config = TrainConfig {
        image_height: 100,
        ..TrainConfig::default()
    };
    assert!(matches!(fcn::run(&config), Err(FcnError::InvalidConfig(_))));
}

#[test]
fn test_cli_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("base.json");
    std::fs::write(
        &path,
        r#"{ "epochs": 7, "learning_rate": 0.001, "variant": "class-projection" }"#,
    )
    .unwrap();

    let config = TrainConfig::try_from_args([
        "train",
        "--config",
        path.to_str().unwrap(),
        "--epochs",
        "3",
    ])
    .unwrap();
    assert_eq!(config.epochs, 3);
    assert_eq!(config.learning_rate, 0.001);
    assert_eq!(config.variant, DecoderVariant::ClassProjection);
    // 文件与命令行都未给出的项取默认值
    assert_eq!(config.batch_size, TrainConfig::default().batch_size);
    assert_eq!(config.image_shape(), (160, 576));
    assert!(config.validate().is_ok());
}

#[test]
fn test_cli_errors_are_reported_as_invalid_config() {
    assert!(matches!(
        TrainConfig::try_from_args(["train", "--epochs", "many"]),
        Err(FcnError::InvalidConfig(_))
    ));
    assert!(matches!(
        TrainConfig::try_from_args(["train", "--variant", "unknown"]),
        Err(FcnError::InvalidConfig(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ epochs: ").unwrap();
    assert!(matches!(
        TrainConfig::try_from_args(["train", "--config", path.to_str().unwrap()]),
        Err(FcnError::InvalidConfig(_))
    ));
}

#[test]
fn test_validate_rejects_out_of_range_values() {
    let base = TrainConfig::default();
    assert!(base.validate().is_ok());
    for config in [
        TrainConfig {
            batch_size: 0,
            ..base.clone()
        },
        TrainConfig {
            learning_rate: 0.0,
            ..base.clone()
        },
        TrainConfig {
            keep_prob: 1.5,
            ..base.clone()
        },
        TrainConfig {
            num_classes: 1,
            ..base.clone()
        },
        TrainConfig {
            image_width: 600,
            ..base.clone()
        },
    ] {
        assert!(matches!(config.validate(), Err(FcnError::InvalidConfig(_))));
    }
}
