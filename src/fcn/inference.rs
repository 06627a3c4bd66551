/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 推理样例：对KITTI测试集的每张图像做分割，把道路概率大于0.5的像素以半透明绿色叠加到原图，
 *                 结果写入`runs/<时间戳>/<原文件名>`。
 */

use super::FcnError;
use crate::data::transforms::resize_image;
use crate::data::{DataError, testing_images};
use crate::nn::{DynamicShape, GraphError, Var};
use crate::tensor::Tensor;
use crate::vision::{ROAD_OVERLAY_COLOR, ROAD_THRESHOLD, Vision};
use ndarray::Ix2;
use std::fs;
use std::path::{Path, PathBuf};

/// 道路类别在得分中的下标
pub const ROAD_CLASS: usize = 1;

/// 从展平的得分`[H·W, C]`计算某一类别的逐像素softmax概率，形状为[H, W]
pub fn class_probability(
    logits: &Tensor,
    image_shape: (usize, usize),
    class: usize,
) -> Result<Tensor, FcnError> {
    let (height, width) = image_shape;
    let shape = logits.shape();
    if shape.len() != 2 || shape[0] != height * width || class >= shape[1] {
        return Err(FcnError::Graph(GraphError::ShapeMismatch {
            expected: DynamicShape::new(&[Some(height * width), None]),
            got: DynamicShape::fixed(shape),
            message: format!("得分与图像尺寸{height}x{width}或类别下标{class}不符"),
        }));
    }
    let probability = logits
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|e| GraphError::ComputationError(e.to_string()))?
        .rows()
        .into_iter()
        .map(|row| {
            let max = row.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
            let sum: f32 = row.iter().map(|&v| (v - max).exp()).sum();
            (row[class] - max).exp() / sum
        })
        .collect::<Vec<_>>();
    Tensor::try_new(probability, &[height, width])
        .map_err(|e| FcnError::Data(DataError::Tensor(e)))
}

/// 对`data_dir/data_road/testing/image_2`下的所有图像做推理，并把叠加结果写入`runs_dir`下新建的时间戳目录。
/// 返回该目录
pub fn save_inference_samples<P: AsRef<Path>, Q: AsRef<Path>>(
    runs_dir: P,
    data_dir: Q,
    image_shape: (usize, usize),
    logits: &Var,
    keep_prob: &Var,
    image_input: &Var,
) -> Result<PathBuf, FcnError> {
    let output_dir = runs_dir
        .as_ref()
        .join(chrono::Local::now().format("%Y%m%d_%H%M%S%.3f").to_string());
    fs::create_dir_all(&output_dir)?;
    tracing::info!("推理结果将保存到：{}", output_dir.display());

    let images = testing_images(data_dir.as_ref().join("data_road"))?;
    let graph = logits.get_graph();
    graph.no_grad_scope(|_| -> Result<(), FcnError> {
        keep_prob.feed(&Tensor::ones(&[1, 1]))?;
        for path in &images {
            let image = resize_image(&crate::data::open_rgb(path)?, image_shape);
            image_input.feed(&Tensor::from_rgb_image(&image))?;
            logits.forward()?;
            let scores = logits
                .value()?
                .ok_or_else(|| GraphError::ComputationError("得分没有值".to_string()))?;
            let road = class_probability(&scores, image_shape, ROAD_CLASS)?;
            let overlay =
                Vision::overlay_segmentation(&image, &road, ROAD_THRESHOLD, ROAD_OVERLAY_COLOR)
                    .map_err(FcnError::Image)?;
            let name = path.file_name().ok_or_else(|| {
                FcnError::Image(format!("无法取得{}的文件名", path.display()))
            })?;
            overlay
                .save(output_dir.join(name))
                .map_err(|e| FcnError::Image(e.to_string()))?;
        }
        Ok(())
    })?;
    tracing::info!("已保存{}张推理样例", images.len());
    Ok(output_dir)
}
