
use image::{Rgb, RgbImage};
use std::path::Path;

/// KITTI 标注中道路像素的颜色
pub(super) const ROAD_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

/// 上半部分为背景、下半部分为道路的标注图
pub(super) fn half_road_label(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        if y < height / 2 {
            Rgb([255, 0, 0])
        } else {
            ROAD_COLOR
        }
    })
}

/// 按KITTI road的目录结构写出一个迷你数据集：
/// `names`为训练图像的文件名主干（如`um_000000`），每张训练图像都会有对应的`_road_`与`_lane_`标注
pub(super) fn write_mini_kitti(data_dir: &Path, names: &[&str], width: u32, height: u32) {
    let training = data_dir.join("data_road").join("training");
    let testing = data_dir.join("data_road").join("testing");
    for dir in [
        training.join("image_2"),
        training.join("gt_image_2"),
        testing.join("image_2"),
    ] {
        std::fs::create_dir_all(dir).unwrap();
    }
    for (i, name) in names.iter().enumerate() {
        let shade = (i as u8).wrapping_mul(40);
        let image = RgbImage::from_pixel(width, height, Rgb([shade, 128, 255 - shade]));
        image
            .save(training.join("image_2").join(format!("{name}.png")))
            .unwrap();
        image
            .save(testing.join("image_2").join(format!("{name}.png")))
            .unwrap();
        let (prefix, number) = name.split_once('_').unwrap();
        let label = half_road_label(width, height);
        label
            .save(
                training
                    .join("gt_image_2")
                    .join(format!("{prefix}_road_{number}.png")),
            )
            .unwrap();
        label
            .save(
                training
                    .join("gt_image_2")
                    .join(format!("{prefix}_lane_{number}.png")),
            )
            .unwrap();
    }
}
