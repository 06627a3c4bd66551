use crate::errors::TensorError;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_new_and_index() {
    let tensor = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    assert_eq!(tensor.shape(), &[2, 3]);
    assert_eq!(tensor.size(), 6);
    assert_eq!(tensor[[1, 0]], 4.);
    assert_eq!(tensor[[0, 2]], 3.);
}

#[test]
#[should_panic]
fn test_new_with_mismatched_data_len() {
    let _ = Tensor::new(&[1., 2., 3.], &[2, 2]);
}

#[test]
fn test_try_new_reports_mismatch() {
    let result = Tensor::try_new(vec![1., 2., 3.], &[2, 2]);
    assert_eq!(
        result,
        Err(TensorError::DataShapeMismatch {
            data_len: 3,
            shape: vec![2, 2],
        })
    );
}

#[test]
fn test_number_of_scalar_tensor() {
    assert_eq!(Tensor::new(&[3.5], &[1, 1]).number(), Some(3.5));
    assert_eq!(Tensor::new(&[1., 2.], &[2]).number(), None);
}

#[test]
fn test_truncated_normal_stays_within_two_std() {
    let mut rng = StdRng::seed_from_u64(42);
    let tensor = Tensor::truncated_normal_with_rng(0.0, 0.01, &[64, 32, 3, 3], &mut rng);
    assert_eq!(tensor.shape(), &[64, 32, 3, 3]);
    assert!(tensor.max_abs() <= 0.02 + 1e-6);
    // 样本量足够大时均值应接近0
    assert!(tensor.mean().abs() < 1e-3);
}

#[test]
fn test_random_tensors_are_reproducible_with_same_seed() {
    let a = Tensor::normal_with_rng(0.0, 1.0, &[4, 4], &mut StdRng::seed_from_u64(7));
    let b = Tensor::normal_with_rng(0.0, 1.0, &[4, 4], &mut StdRng::seed_from_u64(7));
    assert_eq!(a, b);

    let u = Tensor::uniform_with_rng(-1.0, 1.0, &[100], &mut StdRng::seed_from_u64(7));
    assert!(u.max_abs() <= 1.0);
}
