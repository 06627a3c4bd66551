//! # Road FCN
//!
//! `road_fcn`在冻结的预训练VGG16骨干网络之上微调一个全卷积网络（FCN）解码器，
//! 对KITTI road数据集做逐像素的道路/非道路语义分割。
//! 计算图、自动微分、卷积与优化器都用纯rust实现（见[`nn`]）。
//!
//! ```ignore
//! use road_fcn::{config::TrainConfig, fcn, logging};
//!
//! logging::init("info");
//! let config = TrainConfig::from_cli()?;
//! let summary = fcn::run(&config)?;
//! println!("推理样例保存在{}", summary.output_dir.display());
//! ```

pub mod config;
pub mod data;
pub mod errors;
pub mod fcn;
pub mod logging;
pub mod nn;
pub mod tensor;
pub mod utils;
pub mod vision;
