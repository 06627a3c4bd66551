use crate::assert_err;
use crate::nn::{Graph, GraphError};
use crate::tensor::Tensor;

#[test]
fn test_dropout_in_train_mode_zeroes_and_rescales() {
    let graph = Graph::new_with_seed(11);
    let x = graph.input(&Tensor::ones(&[1, 4, 50, 50])).unwrap();
    let keep_prob = graph.input(&Tensor::new(&[0.5], &[1, 1])).unwrap();
    let y = x.dropout(&keep_prob).unwrap();
    y.forward().unwrap();
    let value = y.value().unwrap().unwrap();

    // 每个元素要么被置0，要么放大为1 / 0.5 = 2
    assert!(value.data_as_slice().iter().all(|&v| v == 0. || v == 2.));
    let kept = value.data_as_slice().iter().filter(|&&v| v == 2.).count();
    let ratio = kept as f32 / value.size() as f32;
    assert!((ratio - 0.5).abs() < 0.05, "保留比例{ratio}偏离0.5过多");
}

#[test]
fn test_dropout_is_identity_in_eval_mode_or_keep_prob_one() {
    let graph = Graph::new_with_seed(11);
    let data = Tensor::new(&[1., -2., 3., -4.], &[1, 1, 2, 2]);
    let x = graph.input(&data).unwrap();
    let keep_prob = graph.input(&Tensor::new(&[0.5], &[1, 1])).unwrap();
    let y = x.dropout(&keep_prob).unwrap();

    graph.eval();
    y.forward().unwrap();
    assert_eq!(y.value().unwrap().unwrap(), data);

    graph.train();
    keep_prob.feed(&Tensor::new(&[1.0], &[1, 1])).unwrap();
    y.forward().unwrap();
    assert_eq!(y.value().unwrap().unwrap(), data);
}

#[test]
fn test_dropout_rejects_invalid_keep_prob() {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 1, 2, 2])).unwrap();
    let keep_prob = graph.input(&Tensor::new(&[0.0], &[1, 1])).unwrap();
    let y = x.dropout(&keep_prob).unwrap();
    assert_err!(y.forward(), GraphError::ComputationError(_));

    let not_scalar = graph.input(&Tensor::ones(&[1, 2])).unwrap();
    assert_err!(x.dropout(&not_scalar), GraphError::ShapeMismatch { .. });
}
