use crate::assert_err;
use crate::nn::{Graph, GraphError, Init};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_softmax_cross_entropy_value() {
    let graph = Graph::new();
    // 第一行两类得分相同：损失ln2；第二行logits为[0, ln3]，标签为第1类：损失ln(4/3)
    let logits = graph
        .input(&Tensor::new(&[1., 1., 0., 3f32.ln()], &[2, 2]))
        .unwrap();
    let labels = graph.input(&Tensor::new(&[1., 0., 0., 1.], &[2, 2])).unwrap();
    let loss = logits.softmax_cross_entropy(&labels).unwrap();
    loss.forward().unwrap();
    let expected = (2f32.ln() + (4f32 / 3.).ln()) / 2.;
    assert_abs_diff_eq!(
        loss.value().unwrap().unwrap().number().unwrap(),
        expected,
        epsilon = 1e-6
    );
}

#[test]
fn test_softmax_cross_entropy_is_stable_for_large_logits() {
    let graph = Graph::new();
    let logits = graph
        .input(&Tensor::new(&[1000., 0., -1000., 1000.], &[2, 2]))
        .unwrap();
    let labels = graph.input(&Tensor::new(&[1., 0., 1., 0.], &[2, 2])).unwrap();
    let loss = logits.softmax_cross_entropy(&labels).unwrap();
    loss.forward().unwrap();
    let value = loss.value().unwrap().unwrap().number().unwrap();
    // 第一行预测正确损失约为0，第二行错了2000个单位
    assert!(value.is_finite());
    assert_abs_diff_eq!(value, 1000., epsilon = 1e-3);
}

#[test]
fn test_softmax_cross_entropy_grad() {
    let graph = Graph::new_with_seed(0);
    let logits = graph.parameter(&[2, 3], Init::Zeros, "logits").unwrap();
    let labels = graph
        .input(&Tensor::new(&[0., 1., 0., 0., 0., 1.], &[2, 3]))
        .unwrap();
    let loss = logits.softmax_cross_entropy(&labels).unwrap();
    let value = loss.backward().unwrap();
    assert_abs_diff_eq!(value, 3f32.ln(), epsilon = 1e-6);

    // 梯度 = (softmax - labels) / 行数
    let grad = logits.grad().unwrap().unwrap();
    let third = 1. / 3.;
    let expected = [third / 2., (third - 1.) / 2., third / 2., third / 2., third / 2., (third - 1.) / 2.];
    for (got, want) in grad.data_as_slice().iter().zip(expected) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
    }
}

#[test]
fn test_softmax_cross_entropy_rejects_mismatched_labels() {
    let graph = Graph::new();
    let logits = graph.input(&Tensor::zeros(&[4, 2])).unwrap();
    let labels = graph.input(&Tensor::zeros(&[4, 3])).unwrap();
    assert_err!(
        logits.softmax_cross_entropy(&labels),
        GraphError::ShapeMismatch { .. }
    );
}
