use super::Vision;
use crate::tensor::Tensor;
use image::{Rgb, RgbImage, Rgba};

/// 道路像素的叠加颜色：绿色，alpha = 127/255
pub const ROAD_OVERLAY_COLOR: Rgba<u8> = Rgba([0, 255, 0, 127]);

/// 道路概率超过该值的像素被视为道路
pub const ROAD_THRESHOLD: f32 = 0.5;

impl Vision {
    /// 逐像素判断是否为道路：`road_probability`的形状须为[H, W]
    pub fn road_mask(road_probability: &Tensor, threshold: f32) -> Result<Vec<bool>, String> {
        if road_probability.dimension() != 2 {
            return Err(format!(
                "道路概率图的形状应为[H, W]，而不是{:?}",
                road_probability.shape()
            ));
        }
        Ok(road_probability
            .data_as_slice()
            .iter()
            .map(|&p| p > threshold)
            .collect())
    }

    /// 将道路概率大于`threshold`的像素以`color`按其alpha混合到原图上
    pub fn overlay_segmentation(
        image: &RgbImage,
        road_probability: &Tensor,
        threshold: f32,
        color: Rgba<u8>,
    ) -> Result<RgbImage, String> {
        let (width, height) = image.dimensions();
        if road_probability.shape() != [height as usize, width as usize] {
            return Err(format!(
                "道路概率图的形状{:?}与图像尺寸{}x{}（宽x高）不符",
                road_probability.shape(),
                width,
                height
            ));
        }
        let mask = Self::road_mask(road_probability, threshold)?;
        let alpha = u32::from(color[3]);
        let blend = |base: u8, paint: u8| -> u8 {
            ((u32::from(base) * (255 - alpha) + u32::from(paint) * alpha + 127) / 255) as u8
        };

        let mut output = image.clone();
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            if mask[y as usize * width as usize + x as usize] {
                let Rgb([r, g, b]) = *pixel;
                *pixel = Rgb([blend(r, color[0]), blend(g, color[1]), blend(b, color[2])]);
            }
        }
        Ok(output)
    }
}
