/*
 * @Author       : 老董
 * @Date         : 2023-10-21 03:22:26
 * @Description  : 张量与`image`库RGB图像之间的转换（图内NCHW，像素值归一化到[0,1]）
 */

use super::Tensor;
use image::{Rgb, RgbImage};
use ndarray::Array4;

impl Tensor {
    /// 将RGB图像转换为形状为[1, 3, H, W]的张量，像素值除以255
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let mut data = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in image.enumerate_pixels() {
            for c in 0..3 {
                data[[0, c, y as usize, x as usize]] = f32::from(pixel[c]) / 255.0;
            }
        }
        Self::from_array(data.into_dyn())
    }

    /// `from_rgb_image`的逆：张量形状须为[1, 3, H, W]或[3, H, W]，
    /// 像素值会先截断到[0,1]再乘以255。若形状不符则返回Err。
    pub fn to_rgb_image(&self) -> Result<RgbImage, String> {
        let chw = match self.shape() {
            [1, 3, _, _] => self.reshape(&self.shape()[1..]),
            [3, _, _] => self.clone(),
            shape => {
                return Err(format!(
                    "图像张量的形状应为[1, 3, H, W]或[3, H, W]，而不是{shape:?}"
                ));
            }
        };
        let (height, width) = (chw.shape()[1], chw.shape()[2]);
        let view = chw.view();
        let mut image = RgbImage::new(width as u32, height as u32);
        for y in 0..height {
            for x in 0..width {
                let channel = |c: usize| (view[[c, y, x]].clamp(0.0, 1.0) * 255.0).round() as u8;
                image.put_pixel(x as u32, y as u32, Rgb([channel(0), channel(1), channel(2)]));
            }
        }
        Ok(image)
    }
}
