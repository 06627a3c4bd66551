//! 数据变换函数
//!
//! - 缩放：图像用三角（双线性）插值，标注用最近邻插值，避免标注颜色被混合
//! - 标签编码：标注颜色等于背景色的像素为类别0，其余为类别1

use crate::tensor::Tensor;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array4;

/// KITTI road 标注图中的背景（非道路）颜色
pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// 缩放到`(height, width)`；尺寸已一致时原样返回
pub fn resize(image: &RgbImage, shape: (usize, usize), filter: FilterType) -> RgbImage {
    let (height, width) = shape;
    if image.dimensions() == (width as u32, height as u32) {
        return image.clone();
    }
    imageops::resize(image, width as u32, height as u32, filter)
}

/// 缩放训练图像
pub fn resize_image(image: &RgbImage, shape: (usize, usize)) -> RgbImage {
    resize(image, shape, FilterType::Triangle)
}

/// 缩放标注图像
pub fn resize_label(label: &RgbImage, shape: (usize, usize)) -> RgbImage {
    resize(label, shape, FilterType::Nearest)
}

/// 将标注图编码为形状为`[1, num_classes, H, W]`的 one-hot 张量：
/// 通道0为背景，通道1为道路（即非背景色的所有像素），其余通道恒为0。`num_classes`不足2时按2处理
pub fn encode_road_label(label: &RgbImage, background: Rgb<u8>, num_classes: usize) -> Tensor {
    let (width, height) = label.dimensions();
    let channels = num_classes.max(2);
    let mut data = Array4::<f32>::zeros((1, channels, height as usize, width as usize));
    for (x, y, pixel) in label.enumerate_pixels() {
        let class = usize::from(*pixel != background);
        data[[0, class, y as usize, x as usize]] = 1.0;
    }
    Tensor::from_array(data.into_dyn())
}
