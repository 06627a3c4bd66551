/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 预训练VGG16骨干网络的加载与保存
 *
 * saved-model目录格式：
 * <path>/saved_model.json         SavedModelMeta（格式版本、标签、网络结构、输出名）
 * <path>/variables/variables.bin  ParamsFile（按名称排列的全部卷积核与偏置）
 *
 * 网络结构：5个卷积块（3x3卷积 + ReLU，块末2x2最大池化），之后是fc6（kxk卷积）与fc7（1x1卷积），
 * 两者均接ReLU和dropout。对外暴露pool3、pool4、fc7三个特征图（步长8、16、32）。
 * 骨干网络的参数全部不可训练。
 */

use super::{FcnError, Session};
use crate::nn::layer::Conv2d;
use crate::nn::{DynamicShape, GraphError, Module, ParamsFile, Var};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 本crate写出的saved-model格式版本
pub const SAVED_MODEL_VERSION: u32 = 1;
/// 能加载的最低saved-model格式版本
pub const MIN_SAVED_MODEL_VERSION: u32 = 1;
/// VGG骨干网络的saved-model必须带有的标签
pub const VGG_TAG: &str = "vgg16";

const META_FILE: &str = "saved_model.json";
const VARIABLES_DIR: &str = "variables";
const VARIABLES_FILE: &str = "variables.bin";

pub const IMAGE_INPUT_NAME: &str = "image_input";
pub const KEEP_PROB_NAME: &str = "keep_prob";
pub const LAYER3_OUT_NAME: &str = "layer3_out";
pub const LAYER4_OUT_NAME: &str = "layer4_out";
pub const LAYER7_OUT_NAME: &str = "layer7_out";
const OUTPUT_NAMES: [&str; 5] = [
    IMAGE_INPUT_NAME,
    KEEP_PROB_NAME,
    LAYER3_OUT_NAME,
    LAYER4_OUT_NAME,
    LAYER7_OUT_NAME,
];

/// 骨干网络结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackboneArch {
    /// 每个卷积块中各卷积层的输出通道数（须恰好5个块）
    pub blocks: Vec<Vec<usize>>,
    /// fc6、fc7的通道数
    pub fc_channels: usize,
    /// fc6的卷积核尺寸（奇数，same填充）
    pub fc6_kernel: usize,
    pub in_channels: usize,
}

impl BackboneArch {
    /// 标准VGG16
    pub fn vgg16() -> Self {
        Self {
            blocks: vec![
                vec![64, 64],
                vec![128, 128],
                vec![256, 256, 256],
                vec![512, 512, 512],
                vec![512, 512, 512],
            ],
            fc_channels: 4096,
            fc6_kernel: 7,
            in_channels: 3,
        }
    }

    /// 与VGG16同构但极窄的结构，用于测试和快速试跑
    pub fn tiny() -> Self {
        Self {
            blocks: vec![vec![4], vec![4], vec![6], vec![8], vec![8]],
            fc_channels: 12,
            fc6_kernel: 3,
            in_channels: 3,
        }
    }

    pub fn validate(&self) -> Result<(), FcnError> {
        let invalid = |reason: String| FcnError::InvalidConfig(format!("骨干网络结构无效：{reason}"));
        if self.blocks.len() != 5 {
            return Err(invalid(format!("须有5个卷积块，实际为{}", self.blocks.len())));
        }
        if self.blocks.iter().any(|block| block.is_empty() || block.contains(&0)) {
            return Err(invalid("卷积块不能为空，通道数须大于0".to_string()));
        }
        if self.in_channels == 0 || self.fc_channels == 0 {
            return Err(invalid("输入通道数与fc通道数须大于0".to_string()));
        }
        if self.fc6_kernel % 2 == 0 {
            return Err(invalid(format!("fc6的卷积核尺寸须为奇数，实际为{}", self.fc6_kernel)));
        }
        Ok(())
    }

    /// 依次列出所有卷积层：(名称, 输入通道, 输出通道, 卷积核尺寸)
    fn conv_layers(&self) -> Vec<(String, usize, usize, usize)> {
        let mut layers = Vec::new();
        let mut in_channels = self.in_channels;
        for (b, block) in self.blocks.iter().enumerate() {
            for (i, &out_channels) in block.iter().enumerate() {
                layers.push((format!("conv{}_{}", b + 1, i + 1), in_channels, out_channels, 3));
                in_channels = out_channels;
            }
        }
        layers.push(("fc6".to_string(), in_channels, self.fc_channels, self.fc6_kernel));
        layers.push(("fc7".to_string(), self.fc_channels, self.fc_channels, 1));
        layers
    }

    /// 变量文件中应有的全部变量及其形状
    pub fn variable_shapes(&self) -> Vec<(String, Vec<usize>)> {
        self.conv_layers()
            .into_iter()
            .flat_map(|(name, c_in, c_out, k)| {
                [
                    (format!("{name}_K"), vec![c_out, c_in, k, k]),
                    (format!("{name}_b"), vec![1, c_out]),
                ]
            })
            .collect()
    }

    /// 三个特征图的通道数：(layer3, layer4, layer7)
    pub fn feature_channels(&self) -> (usize, usize, usize) {
        let last = |block: &Vec<usize>| block.last().copied().unwrap_or_default();
        (last(&self.blocks[2]), last(&self.blocks[3]), self.fc_channels)
    }
}

/// `saved_model.json`的内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedModelMeta {
    pub format_version: u32,
    pub tags: Vec<String>,
    pub arch: BackboneArch,
    pub outputs: Vec<String>,
}

impl SavedModelMeta {
    pub fn new(arch: BackboneArch) -> Self {
        Self {
            format_version: SAVED_MODEL_VERSION,
            tags: vec![VGG_TAG.to_string()],
            arch,
            outputs: OUTPUT_NAMES.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, FcnError> {
        let path = path.as_ref();
        let meta_path = path.join(META_FILE);
        if !meta_path.is_file() {
            return Err(FcnError::InvalidSavedModel {
                path: path.to_path_buf(),
                reason: format!("缺少{META_FILE}"),
            });
        }
        let text = fs::read_to_string(&meta_path)?;
        serde_json::from_str(&text)
            .map_err(|e| FcnError::Serialization(format!("解析{}失败：{e}", meta_path.display())))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), FcnError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| FcnError::Serialization(e.to_string()))?;
        fs::write(path.as_ref().join(META_FILE), text)?;
        Ok(())
    }

    /// 版本、标签、输出名检查
    fn check(&self, path: &Path) -> Result<(), FcnError> {
        if self.format_version < MIN_SAVED_MODEL_VERSION {
            return Err(FcnError::UnsupportedVersion {
                found: self.format_version,
                required: MIN_SAVED_MODEL_VERSION,
            });
        }
        if !self.tags.iter().any(|tag| tag == VGG_TAG) {
            return Err(FcnError::MissingTag(VGG_TAG.to_string()));
        }
        if let Some(missing) = OUTPUT_NAMES
            .iter()
            .find(|name| !self.outputs.iter().any(|output| output == *name))
        {
            return Err(FcnError::InvalidSavedModel {
                path: path.to_path_buf(),
                reason: format!("未声明输出`{missing}`"),
            });
        }
        self.arch.validate()
    }
}

fn variables_path(path: &Path) -> PathBuf {
    path.join(VARIABLES_DIR).join(VARIABLES_FILE)
}

/// 读取saved-model目录中保存的全部变量
pub fn read_variables<P: AsRef<Path>>(path: P) -> Result<ParamsFile, FcnError> {
    let path = path.as_ref();
    let variables = variables_path(path);
    if !variables.is_file() {
        return Err(FcnError::InvalidSavedModel {
            path: path.to_path_buf(),
            reason: format!("缺少{VARIABLES_DIR}/{VARIABLES_FILE}"),
        });
    }
    Ok(ParamsFile::load(variables)?)
}

fn variable(variables: &ParamsFile, name: String) -> Result<&Tensor, FcnError> {
    variables.get(&name).ok_or(FcnError::MissingVariable(name))
}

/// 以随机权重（He初始化）写出一个saved-model，供测试与无预训练权重时试跑
pub fn write_random_checkpoint<P: AsRef<Path>>(
    path: P,
    arch: &BackboneArch,
    seed: u64,
) -> Result<(), FcnError> {
    arch.validate()?;
    let path = path.as_ref();
    fs::create_dir_all(path.join(VARIABLES_DIR))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let entries = arch
        .variable_shapes()
        .into_iter()
        .map(|(name, shape)| {
            let value = if name.ends_with("_b") {
                Tensor::zeros(&shape)
            } else {
                let fan_in = (shape[1] * shape[2] * shape[3]) as f32;
                Tensor::normal_with_rng(0.0, (2.0 / fan_in).sqrt(), &shape, &mut rng)
            };
            (name, value)
        })
        .collect();
    ParamsFile::new(entries).save(variables_path(path))?;
    SavedModelMeta::new(arch.clone()).write(path)
}

/// 骨干网络输出的三个特征图
#[derive(Debug, Clone)]
pub struct FeatureMaps {
    /// pool3，步长8
    pub layer3_out: Var,
    /// pool4，步长16
    pub layer4_out: Var,
    /// fc7，步长32
    pub layer7_out: Var,
}

/// 已加载到会话图中的骨干网络
#[derive(Debug)]
pub struct Backbone {
    pub image_input: Var,
    pub keep_prob: Var,
    pub layer3_out: Var,
    pub layer4_out: Var,
    pub layer7_out: Var,
    arch: BackboneArch,
    layers: Vec<Conv2d>,
}

impl Backbone {
    /// 加载saved-model，输入图像的空间尺寸不限
    pub fn load<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, FcnError> {
        Self::load_inner(session, path.as_ref(), None)
    }

    /// 加载saved-model，并把输入图像的尺寸固定为`(height, width)`，
    /// 使解码器中的形状不一致在建图时就能发现
    pub fn load_with_image_shape<P: AsRef<Path>>(
        session: &Session,
        path: P,
        image_shape: (usize, usize),
    ) -> Result<Self, FcnError> {
        Self::load_inner(session, path.as_ref(), Some(image_shape))
    }

    fn load_inner(
        session: &Session,
        path: &Path,
        image_shape: Option<(usize, usize)>,
    ) -> Result<Self, FcnError> {
        let meta = SavedModelMeta::read(path)?;
        meta.check(path)?;
        let variables = read_variables(path)?;
        for (name, shape) in meta.arch.variable_shapes() {
            let value = variables
                .get(&name)
                .ok_or_else(|| FcnError::MissingVariable(name.clone()))?;
            if value.shape() != shape.as_slice() {
                return Err(FcnError::VariableShapeMismatch {
                    name,
                    expected: shape,
                    got: value.shape().to_vec(),
                });
            }
        }
        let backbone = Self::build(session, meta.arch, &variables, image_shape)?;
        tracing::info!(
            "已从{}加载骨干网络：{}个卷积层",
            path.display(),
            backbone.layers.len()
        );
        Ok(backbone)
    }

    fn build(
        session: &Session,
        arch: BackboneArch,
        variables: &ParamsFile,
        image_shape: Option<(usize, usize)>,
    ) -> Result<Self, FcnError> {
        let graph = session.graph();
        let (height, width) = image_shape.unzip();
        let image_input = graph.placeholder(
            DynamicShape::new(&[None, Some(arch.in_channels), height, width]),
            IMAGE_INPUT_NAME,
        )?;
        let keep_prob = graph.placeholder(DynamicShape::fixed(&[1, 1]), KEEP_PROB_NAME)?;
        keep_prob.feed(&Tensor::ones(&[1, 1]))?;

        let frozen_conv = |name: &str, padding: usize| -> Result<Conv2d, FcnError> {
            let kernel = variable(variables, format!("{name}_K"))?;
            let bias = variable(variables, format!("{name}_b"))?;
            Ok(Conv2d::frozen(
                graph,
                kernel,
                Some(bias),
                (1, 1),
                (padding, padding),
                name,
            )?)
        };

        let mut layers = Vec::new();
        let mut pools = Vec::with_capacity(arch.blocks.len());
        let mut x = image_input.clone();
        for (b, block) in arch.blocks.iter().enumerate() {
            for i in 0..block.len() {
                let conv = frozen_conv(&format!("conv{}_{}", b + 1, i + 1), 1)?;
                x = conv.forward(&x)?.relu()?;
                layers.push(conv);
            }
            x = x.max_pool2d((2, 2), (2, 2))?;
            pools.push(x.clone());
        }
        let fc6 = frozen_conv("fc6", arch.fc6_kernel / 2)?;
        x = fc6.forward(&x)?.relu()?.dropout(&keep_prob)?;
        layers.push(fc6);
        let fc7 = frozen_conv("fc7", 0)?;
        let layer7_out = fc7.forward(&x)?.relu()?.dropout(&keep_prob)?;
        layers.push(fc7);

        Ok(Self {
            image_input,
            keep_prob,
            layer3_out: pools[2].clone(),
            layer4_out: pools[3].clone(),
            layer7_out,
            arch,
            layers,
        })
    }

    pub fn feature_maps(&self) -> FeatureMaps {
        FeatureMaps {
            layer3_out: self.layer3_out.clone(),
            layer4_out: self.layer4_out.clone(),
            layer7_out: self.layer7_out.clone(),
        }
    }

    pub const fn arch(&self) -> &BackboneArch {
        &self.arch
    }

    /// 骨干网络的全部（冻结）参数
    pub fn variables(&self) -> Vec<Var> {
        self.layers.iter().flat_map(Module::parameters).collect()
    }

    /// 当前内存中的参数值（名称与变量文件中的一致）
    pub fn snapshot(&self) -> Result<ParamsFile, FcnError> {
        let entries = self
            .variables()
            .iter()
            .map(|var| {
                let value = var.value()?.ok_or_else(|| {
                    GraphError::ComputationError(format!("骨干网络参数{}没有值", var.node_id()))
                })?;
                Ok((var.name()?, value))
            })
            .collect::<Result<Vec<_>, GraphError>>()?;
        Ok(ParamsFile::new(entries))
    }

    /// 以saved-model格式保存当前参数
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FcnError> {
        let path = path.as_ref();
        fs::create_dir_all(path.join(VARIABLES_DIR))?;
        self.snapshot()?.save(variables_path(path))?;
        SavedModelMeta::new(self.arch.clone()).write(path)
    }
}
