use crate::tensor::Tensor;
use image::{Rgb, RgbImage};

#[test]
fn test_rgb_image_to_nchw_tensor_and_back() {
    let mut image = RgbImage::new(3, 2);
    image.put_pixel(0, 0, Rgb([255, 0, 0]));
    image.put_pixel(2, 1, Rgb([0, 51, 255]));

    let tensor = Tensor::from_rgb_image(&image);
    assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
    assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
    assert_eq!(tensor[[0, 1, 1, 2]], 0.2);
    assert_eq!(tensor[[0, 2, 1, 2]], 1.0);

    assert_eq!(tensor.to_rgb_image().unwrap(), image);
}

#[test]
fn test_to_rgb_image_rejects_non_image_shape() {
    assert!(Tensor::zeros(&[2, 3, 4, 4]).to_rgb_image().is_err());
    assert!(Tensor::zeros(&[1, 4, 4]).to_rgb_image().is_err());
}
