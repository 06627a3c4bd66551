/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 训练配置：默认值 ← `--config`指定的JSON文件 ← 命令行参数，后者覆盖前者。
 *                 生效的配置会以JSON形式保存到本次运行的输出目录，便于复现。
 */

use crate::fcn::{DecoderVariant, FcnError, Hyperparameters};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// 骨干网络的下采样倍数：输入尺寸须为其整数倍，跳跃连接的形状才能对齐
const BACKBONE_STRIDE: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub keep_prob: f32,
    pub num_classes: usize,
    pub image_height: usize,
    pub image_width: usize,
    /// 内含`vgg/`与`data_road/`
    pub data_dir: PathBuf,
    pub runs_dir: PathBuf,
    pub variant: DecoderVariant,
    pub seed: Option<u64>,
    /// 训练结束后把解码器参数导出到输出目录
    pub export_decoder: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 8,
            learning_rate: 1e-4,
            keep_prob: 0.5,
            num_classes: 2,
            image_height: 160,
            image_width: 576,
            data_dir: PathBuf::from("./data"),
            runs_dir: PathBuf::from("./runs"),
            variant: DecoderVariant::default(),
            seed: None,
            export_decoder: false,
        }
    }
}

/// 命令行参数。未给出的项沿用`--config`文件（或默认配置）中的值
#[derive(Parser, Debug, Default)]
#[command(name = "train", version, about = "在KITTI road数据集上训练FCN道路分割网络")]
pub struct TrainArgs {
    /// JSON格式的基础配置文件
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// 训练轮数
    #[arg(long)]
    pub epochs: Option<usize>,
    #[arg(long)]
    pub batch_size: Option<usize>,
    #[arg(long)]
    pub learning_rate: Option<f32>,
    /// dropout的保留概率
    #[arg(long)]
    pub keep_prob: Option<f32>,
    #[arg(long)]
    pub num_classes: Option<usize>,
    #[arg(long)]
    pub image_height: Option<usize>,
    #[arg(long)]
    pub image_width: Option<usize>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub runs_dir: Option<PathBuf>,
    /// 解码器结构
    #[arg(long, value_enum)]
    pub variant: Option<DecoderVariant>,
    /// 随机种子（参数初始化、dropout、数据打乱）
    #[arg(long)]
    pub seed: Option<u64>,
    /// 导出训练好的解码器参数
    #[arg(long)]
    pub export_decoder: bool,
}

impl TrainArgs {
    /// 合并为最终配置
    pub fn into_config(self) -> Result<TrainConfig, FcnError> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::load_json(path)?,
            None => TrainConfig::default(),
        };
        macro_rules! override_with {
            ($($field:ident),+) => {
                $(if let Some(value) = self.$field {
                    config.$field = value;
                })+
            };
        }
        override_with!(
            epochs,
            batch_size,
            learning_rate,
            keep_prob,
            num_classes,
            image_height,
            image_width,
            data_dir,
            runs_dir,
            variant
        );
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.export_decoder |= self.export_decoder;
        Ok(config)
    }
}

impl TrainConfig {
    /// 从命令行（及其指定的配置文件）得到配置
    pub fn from_cli() -> Result<Self, FcnError> {
        TrainArgs::parse().into_config()
    }

    /// 从给定的参数列表得到配置（第一个元素为程序名）
    pub fn try_from_args<I, T>(args: I) -> Result<Self, FcnError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        TrainArgs::try_parse_from(args)
            .map_err(|e| FcnError::InvalidConfig(e.to_string()))?
            .into_config()
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, FcnError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| FcnError::InvalidConfig(format!("解析{}失败：{e}", path.display())))
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), FcnError> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| FcnError::Serialization(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), FcnError> {
        let invalid = |reason: String| Err(FcnError::InvalidConfig(reason));
        if self.batch_size == 0 {
            return invalid("batch_size 必须大于 0".to_string());
        }
        if !(self.learning_rate > 0.0) {
            return invalid(format!("学习率须大于0，实际为{}", self.learning_rate));
        }
        if !(self.keep_prob > 0.0 && self.keep_prob <= 1.0) {
            return invalid(format!("keep_prob须在(0, 1]之间，实际为{}", self.keep_prob));
        }
        if self.num_classes < 2 {
            return invalid(format!("类别数至少为2（背景与道路），实际为{}", self.num_classes));
        }
        for (name, size) in [("image_height", self.image_height), ("image_width", self.image_width)] {
            if size == 0 || size % BACKBONE_STRIDE != 0 {
                return invalid(format!(
                    "{name}须为{BACKBONE_STRIDE}的正整数倍，实际为{size}"
                ));
            }
        }
        Ok(())
    }

    /// (height, width)
    pub const fn image_shape(&self) -> (usize, usize) {
        (self.image_height, self.image_width)
    }

    pub const fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            keep_prob: self.keep_prob,
        }
    }

    pub fn vgg_dir(&self) -> PathBuf {
        self.data_dir.join("vgg")
    }

    pub fn training_dir(&self) -> PathBuf {
        self.data_dir.join("data_road").join("training")
    }
}
