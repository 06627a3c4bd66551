use crate::nn::{Graph, Var};
use crate::tensor::Tensor;

mod adam;
mod backward;
mod dropout;
mod max_pool2d;
mod softmax_cross_entropy;

/// 数值梯度检验：逐元素扰动`param`，用中心差分近似损失对其的梯度，并与反向传播结果比较
fn assert_grad_close(loss: &Var, param: &Var, tolerance: f32) {
    let graph = loss.get_graph();
    graph.zero_grad();
    loss.backward().unwrap();
    let analytic = param.grad().unwrap().expect("参数应有梯度");
    let original = param.value().unwrap().unwrap();
    let eps = 1e-2;

    let loss_at = |value: &Tensor| -> f32 {
        param.feed(value).unwrap();
        loss.forward().unwrap();
        loss.value().unwrap().unwrap().number().unwrap()
    };
    for i in 0..original.size() {
        let mut plus = original.clone();
        plus.data_as_slice_mut()[i] += eps;
        let mut minus = original.clone();
        minus.data_as_slice_mut()[i] -= eps;
        let numeric = (loss_at(&plus) - loss_at(&minus)) / (2.0 * eps);
        let got = analytic.data_as_slice()[i];
        assert!(
            (numeric - got).abs() <= tolerance,
            "第{i}个元素的梯度不一致：数值梯度{numeric}，反向传播{got}"
        );
    }
    param.feed(&original).unwrap();
}

/// 以随机one-hot标签构造 `flatten_pixels + softmax_cross_entropy` 损失，用于检验卷积类节点的梯度
fn pixel_loss(graph: &Graph, score: &Var, hot_classes: &[usize]) -> Var {
    let shape = score.value_expected_shape().unwrap().to_vec_fixed().unwrap();
    let classes = shape[1];
    let rows = shape[0] * shape[2] * shape[3];
    assert_eq!(hot_classes.len(), rows);
    let mut labels = Tensor::zeros(&[rows, classes]);
    for (row, &class) in hot_classes.iter().enumerate() {
        labels[[row, class]] = 1.0;
    }
    let labels = graph.input(&labels).unwrap();
    score
        .flatten_pixels()
        .unwrap()
        .softmax_cross_entropy(&labels)
        .unwrap()
}
