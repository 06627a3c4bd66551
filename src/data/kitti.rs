/*
 * @Author       : 老董
 * @Date         : 2025-01-21
 * @Description  : KITTI road 数据集：样本配对、按 epoch 打乱的批数据来源、训练前的完整性检查
 *
 * 目录布局：
 * data_road/training/image_2/um_000000.png
 * data_road/training/gt_image_2/um_road_000000.png   （同目录下还有`_lane_`标注，不使用）
 * data_road/testing/image_2/um_000000.png
 */

use super::transforms::{BACKGROUND_COLOR, encode_road_label, resize_image, resize_label};
use super::{Batch, BatchSource, DataError};
use crate::tensor::Tensor;
use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一个训练样本：图像与其道路标注
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KittiSample {
    pub image: PathBuf,
    pub label: PathBuf,
}

/// 目录中（不递归）所有png文件，按文件名排序
fn png_files(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    if !dir.is_dir() {
        return Err(DataError::FileNotFound(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| DataError::IoError(e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "png") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// 标注文件名对应的图像文件名：`um_road_000000.png` → `um_000000.png`
fn image_name_of_label(label_name: &str) -> Option<String> {
    label_name
        .contains("_road_")
        .then(|| label_name.replacen("_road_", "_", 1))
}

/// 将`training`目录下的每张图像与其`_road_`标注配对
fn pair_samples(training_dir: &Path) -> Result<Vec<KittiSample>, DataError> {
    let images = png_files(&training_dir.join("image_2"))?;
    let labels: HashMap<String, PathBuf> = png_files(&training_dir.join("gt_image_2"))?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            Some((image_name_of_label(name)?, path))
        })
        .collect();

    images
        .into_iter()
        .map(|image| {
            let label = image
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| labels.get(name))
                .cloned()
                .ok_or_else(|| DataError::UnpairedImage(image.clone()))?;
            Ok(KittiSample { image, label })
        })
        .collect()
}

pub(crate) fn open_rgb(path: &Path) -> Result<RgbImage, DataError> {
    Ok(image::open(path)
        .map_err(|source| DataError::ImageError {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8())
}

/// KITTI road 训练集的批数据来源
///
/// 每次调用[`BatchSource::batches`]都会重新打乱样本顺序；图像按需从磁盘读取、缩放到`image_shape`，
/// 标注编码为 one-hot（类别0为背景、类别1为道路，默认共两类）。
#[derive(Debug)]
pub struct KittiRoadBatches {
    samples: Vec<KittiSample>,
    image_shape: (usize, usize),
    num_classes: usize,
    rng: StdRng,
}

impl KittiRoadBatches {
    /// 打开`data_road/training`目录。`image_shape`为`(height, width)`
    pub fn open<P: AsRef<Path>>(
        training_dir: P,
        image_shape: (usize, usize),
    ) -> Result<Self, DataError> {
        let training_dir = training_dir.as_ref();
        let samples = pair_samples(training_dir)?;
        if samples.is_empty() {
            return Err(DataError::DatasetMissing(format!(
                "{}中没有训练图像",
                training_dir.display()
            )));
        }
        tracing::debug!("已配对{}个训练样本", samples.len());
        Ok(Self {
            samples,
            image_shape,
            num_classes: 2,
            rng: StdRng::from_entropy(),
        })
    }

    /// 设置标注的通道数（与解码器的类别数一致），多出的通道恒为0
    pub fn with_num_classes(mut self, num_classes: usize) -> Result<Self, DataError> {
        if num_classes < 2 {
            return Err(DataError::InvalidArgument(format!(
                "道路标注至少需要2个类别，实际为{num_classes}"
            )));
        }
        self.num_classes = num_classes;
        Ok(self)
    }

    /// 设置随机种子（用于每个 epoch 的打乱）
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn samples(&self) -> &[KittiSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 获取批次数量（最后一批可以不满）
    pub fn num_batches(&self, batch_size: usize) -> usize {
        self.samples.len().div_ceil(batch_size.max(1))
    }

    /// 读取并拼接一批样本
    fn load_batch(&self, indices: &[usize]) -> Result<Batch, DataError> {
        let mut images = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &index in indices {
            let sample = &self.samples[index];
            let image = resize_image(&open_rgb(&sample.image)?, self.image_shape);
            let label = resize_label(&open_rgb(&sample.label)?, self.image_shape);
            images.push(Tensor::from_rgb_image(&image));
            labels.push(encode_road_label(&label, BACKGROUND_COLOR, self.num_classes));
        }
        Batch::new(
            Tensor::concat_batch(&images.iter().collect::<Vec<_>>())?,
            Tensor::concat_batch(&labels.iter().collect::<Vec<_>>())?,
        )
    }
}

impl BatchSource for KittiRoadBatches {
    fn batches(
        &mut self,
        batch_size: usize,
    ) -> Box<dyn Iterator<Item = Result<Batch, DataError>> + '_> {
        if batch_size == 0 {
            return Box::new(std::iter::once(Err(DataError::InvalidArgument(
                "batch_size 必须大于 0".to_string(),
            ))));
        }
        let mut order: Vec<usize> = (0..self.samples.len()).collect();
        order.shuffle(&mut self.rng);
        let chunks: Vec<Vec<usize>> = order.chunks(batch_size).map(<[usize]>::to_vec).collect();
        let this = &*self;
        Box::new(chunks.into_iter().map(move |chunk| this.load_batch(&chunk)))
    }
}

/// `testing/image_2`下的所有测试图像
pub fn testing_images<P: AsRef<Path>>(data_road_dir: P) -> Result<Vec<PathBuf>, DataError> {
    png_files(&data_road_dir.as_ref().join("testing").join("image_2"))
}

/// 数据集检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KittiSummary {
    pub training_images: usize,
    pub training_labels: usize,
    pub testing_images: usize,
}

/// 训练前检查`data_dir/data_road`：训练图像、道路标注、测试图像均须存在且非空，
/// 并且每张训练图像都有对应标注。只检查存在性与配对，不要求固定的样本数
pub fn check_kitti_dataset<P: AsRef<Path>>(data_dir: P) -> Result<KittiSummary, DataError> {
    let data_road = data_dir.as_ref().join("data_road");
    let training = data_road.join("training");

    let count = |dir: PathBuf| -> Result<Vec<PathBuf>, DataError> {
        let files = png_files(&dir).map_err(|_| {
            DataError::DatasetMissing(format!("找不到目录{}", dir.display()))
        })?;
        if files.is_empty() {
            return Err(DataError::DatasetMissing(format!(
                "目录{}中没有png图像",
                dir.display()
            )));
        }
        Ok(files)
    };

    let training_images = count(training.join("image_2"))?.len();
    let training_labels = count(training.join("gt_image_2"))?
        .iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .and_then(image_name_of_label)
                .is_some()
        })
        .count();
    let testing_images = count(data_road.join("testing").join("image_2"))?.len();

    let paired = pair_samples(&training).map_err(|e| match e {
        DataError::UnpairedImage(path) => {
            DataError::DatasetMissing(format!("训练图像{}缺少道路标注", path.display()))
        }
        other => other,
    })?;

    let summary = KittiSummary {
        training_images,
        training_labels,
        testing_images,
    };
    tracing::info!(
        "KITTI数据集检查通过：{}张训练图像（{}对已配对），{}张道路标注，{}张测试图像",
        summary.training_images,
        paired.len(),
        summary.training_labels,
        summary.testing_images
    );
    Ok(summary)
}
