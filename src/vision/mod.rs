/*
 * @Author       : 老董
 * @Date         : 2023-08-30 19:16:48
 * @Description  : 本模块提供计算机视觉相关的功能：目前只有把分割结果叠加到原图上以便查看。
 *                 在本模块中，所谓的image/图像是指RGB格式的`image::RgbImage`。
 */

mod overlay;


pub use overlay::{ROAD_OVERLAY_COLOR, ROAD_THRESHOLD};

pub struct Vision {
    // ...
}
