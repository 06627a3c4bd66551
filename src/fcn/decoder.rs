/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : FCN解码器：转置卷积逐级上采样，并与骨干网络的浅层特征相加（跳跃连接），
 *                 最终得到与输入图像同分辨率的逐像素类别得分图[N, num_classes, H, W]。
 *
 * 跳跃连接的两个操作数形状必须完全一致（不做广播），否则建图时即报错。
 */

use super::{FcnError, FeatureMaps, Session};
use crate::nn::layer::{Conv2d, ConvTranspose2d};
use crate::nn::{GraphError, Init, Module, Var};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 解码器权重的初始化：截断正态分布，σ = 0.01
const DECODER_INIT: Init = Init::TruncatedNormal {
    mean: 0.0,
    std: 0.01,
};

/// 解码器结构
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DecoderVariant {
    /// 上采样保持骨干特征的通道数，与原始特征相加，每次上采样后接ReLU
    #[default]
    FullDepth,
    /// 先用1x1卷积把三个特征图都投影到类别数，再上采样并相加，不加激活
    ClassProjection,
}

#[derive(Debug)]
pub struct Decoder {
    score: Var,
    variant: DecoderVariant,
    num_classes: usize,
    parameters: Vec<Var>,
}

/// 特征图的通道数须在建图时确定
fn channels_of(map: &Var, name: &str) -> Result<usize, GraphError> {
    map.value_expected_shape()?.dim(1).ok_or_else(|| {
        GraphError::InvalidOperation(format!("特征图{name}的通道数必须确定"))
    })
}

impl Decoder {
    /// 在骨干网络的特征图之上建立解码器。骨干网络特征图会被截断梯度
    pub fn build(
        session: &Session,
        maps: &FeatureMaps,
        num_classes: usize,
        variant: DecoderVariant,
    ) -> Result<Self, GraphError> {
        if num_classes == 0 {
            return Err(GraphError::InvalidOperation(
                "类别数必须大于0".to_string(),
            ));
        }
        let graph = session.graph();
        let layer3 = maps.layer3_out.detach()?;
        let layer4 = maps.layer4_out.detach()?;
        let layer7 = maps.layer7_out.detach()?;
        let c3 = channels_of(&layer3, "layer3_out")?;
        let c4 = channels_of(&layer4, "layer4_out")?;
        let c7 = channels_of(&layer7, "layer7_out")?;

        let upsample = |c_in: usize, c_out: usize, k: usize, s: usize, name: &str| {
            ConvTranspose2d::new(graph, c_in, c_out, (k, k), (s, s), DECODER_INIT, name)
        };
        let mut parameters = Vec::new();

        let score = match variant {
            DecoderVariant::FullDepth => {
                let up1 = upsample(c7, c4, 4, 2, "decoder_up1")?;
                let fuse1 = up1.forward(&layer7)?.relu()?.add(&layer4)?;
                let up2 = upsample(c4, c3, 4, 2, "decoder_up2")?;
                let fuse2 = up2.forward(&fuse1)?.relu()?.add(&layer3)?;
                let up3 = upsample(c3, num_classes, 16, 8, "decoder_score")?;
                let score = up3.forward(&fuse2)?;
                for layer in [&up1, &up2, &up3] {
                    parameters.extend(layer.parameters());
                }
                score
            }
            DecoderVariant::ClassProjection => {
                let project = |c_in: usize, name: &str| {
                    Conv2d::new(
                        graph,
                        c_in,
                        num_classes,
                        (1, 1),
                        (1, 1),
                        (0, 0),
                        true,
                        DECODER_INIT,
                        name,
                    )
                };
                let proj7 = project(c7, "decoder_proj7")?;
                let proj4 = project(c4, "decoder_proj4")?;
                let proj3 = project(c3, "decoder_proj3")?;
                let up1 = upsample(num_classes, num_classes, 4, 2, "decoder_up1")?;
                let up2 = upsample(num_classes, num_classes, 4, 2, "decoder_up2")?;
                let up3 = upsample(num_classes, num_classes, 16, 8, "decoder_score")?;

                let fuse1 = up1
                    .forward(&proj7.forward(&layer7)?)?
                    .add(&proj4.forward(&layer4)?)?;
                let fuse2 = proj3.forward(&layer3)?.add(&up2.forward(&fuse1)?)?;
                let score = up3.forward(&fuse2)?;
                for layer in [&proj7, &proj4, &proj3] {
                    parameters.extend(layer.parameters());
                }
                for layer in [&up1, &up2, &up3] {
                    parameters.extend(layer.parameters());
                }
                score
            }
        };

        tracing::debug!(
            "解码器（{variant:?}）已建立：{}个可训练参数张量，输出形状{}",
            parameters.len(),
            score.value_expected_shape()?
        );
        Ok(Self {
            score,
            variant,
            num_classes,
            parameters,
        })
    }

    /// 逐像素类别得分图[N, num_classes, H, W]（未经softmax）
    pub const fn score(&self) -> &Var {
        &self.score
    }

    pub const fn variant(&self) -> DecoderVariant {
        self.variant
    }

    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// 导出解码器参数
    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<(), FcnError> {
        self.score.get_graph().save_params(&self.parameters, path)?;
        Ok(())
    }

    pub fn load_params<P: AsRef<Path>>(&self, path: P) -> Result<(), FcnError> {
        self.score.get_graph().load_params(&self.parameters, path)?;
        Ok(())
    }
}

impl Module for Decoder {
    fn parameters(&self) -> Vec<Var> {
        self.parameters.clone()
    }
}
