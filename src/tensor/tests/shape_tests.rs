use crate::errors::TensorError;
use crate::tensor::Tensor;

#[test]
fn test_compare_shapes() {
    let tensor1 = Tensor::new(&[1., 2., 3., 4.], &[1, 4]);
    let tensor2 = Tensor::new(&[1., 2., 3., 4.], &[4]);
    assert!(!tensor1.is_same_shape(&tensor2));
    assert!(tensor1.is_same_shape(&tensor1.clone()));
}

#[test]
fn test_reshape() {
    let tensor = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    let reshaped = tensor.reshape(&[3, 2]);
    assert_eq!(reshaped.shape(), &[3, 2]);
    assert_eq!(reshaped.data_as_slice(), tensor.data_as_slice());
    assert_eq!(tensor.try_reshape(&[4, 2]), Err(TensorError::IncompatibleShape));
}

#[test]
fn test_permute_nchw_to_nhwc() {
    // [1, 2, 1, 2]：两个通道，每个通道两个像素
    let tensor = Tensor::new(&[1., 2., 10., 20.], &[1, 2, 1, 2]);
    let nhwc = tensor.permute(&[0, 2, 3, 1]);
    assert_eq!(nhwc.shape(), &[1, 1, 2, 2]);
    // 置换后数据保持行优先连续布局
    assert_eq!(nhwc.data_as_slice(), &[1., 10., 2., 20.]);
}

#[test]
#[should_panic]
fn test_permute_with_duplicated_axes() {
    let tensor = Tensor::zeros(&[1, 2, 3]);
    let _ = tensor.permute(&[0, 0, 1]);
}

#[test]
fn test_concat_and_select_batch() {
    let a = Tensor::new(&[1., 2.], &[1, 2]);
    let b = Tensor::new(&[3., 4., 5., 6.], &[2, 2]);
    let merged = Tensor::concat_batch(&[&a, &b]).unwrap();
    assert_eq!(merged.shape(), &[3, 2]);
    assert_eq!(merged.select_batch(2), Tensor::new(&[5., 6.], &[1, 2]));

    let c = Tensor::zeros(&[1, 3]);
    assert_eq!(
        Tensor::concat_batch(&[&a, &c]),
        Err(TensorError::InconsitentShape)
    );
    assert_eq!(Tensor::concat_batch(&[]), Err(TensorError::EmptyList));
}
