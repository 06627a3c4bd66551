use crate::nn::{DynamicShape, Graph, Init};
use crate::tensor::Tensor;

#[test]
fn test_max_pool2d_forward() {
    let graph = Graph::new_with_seed(0);
    let data = [
        1., 2., 5., 3., //
        4., 0., 1., 1., //
        0., 0., 9., 8., //
        7., 6., 2., 3., //
    ];
    let x = graph.input(&Tensor::new(&data, &[1, 1, 4, 4])).unwrap();
    let pooled = x.max_pool2d((2, 2), (2, 2)).unwrap();
    pooled.forward().unwrap();
    assert_eq!(
        pooled.value().unwrap().unwrap(),
        Tensor::new(&[4., 5., 7., 9.], &[1, 1, 2, 2])
    );
}

#[test]
fn test_max_pool2d_routes_grad_to_argmax() {
    let graph = Graph::new_with_seed(0);
    let data = [
        1., 2., 5., 3., //
        4., 0., 1., 1., //
        0., 0., 9., 8., //
        7., 6., 2., 3., //
    ];
    let x = graph.parameter(&[1, 1, 4, 4], Init::Zeros, "x").unwrap();
    x.feed(&Tensor::new(&data, &[1, 1, 4, 4])).unwrap();
    // 两个输出通道：第0类得分为池化结果，第1类得分为0
    let mut kernel = Tensor::zeros(&[2, 1, 1, 1]);
    kernel[[0, 0, 0, 0]] = 1.;
    let kernel = graph.input(&kernel).unwrap();
    let mut labels = Tensor::zeros(&[4, 2]);
    for row in 0..4 {
        labels[[row, 1]] = 1.;
    }
    let labels = graph.input(&labels).unwrap();
    let loss = x
        .max_pool2d((2, 2), (2, 2))
        .unwrap()
        .conv2d(&kernel, (1, 1), (0, 0))
        .unwrap()
        .flatten_pixels()
        .unwrap()
        .softmax_cross_entropy(&labels)
        .unwrap();
    loss.backward().unwrap();
    let grad = x.grad().unwrap().unwrap();

    let argmax = [(1, 0), (0, 2), (3, 0), (2, 2)];
    for y in 0..4 {
        for x_pos in 0..4 {
            let g = grad[[0, 0, y, x_pos]];
            if argmax.contains(&(y, x_pos)) {
                assert!(g > 0.0, "最大值位置({y}, {x_pos})应有正梯度");
            } else {
                assert_eq!(g, 0.0);
            }
        }
    }
}

#[test]
fn test_max_pool2d_floor_output_shape() {
    let graph = Graph::new();
    let x = graph
        .placeholder(DynamicShape::with_dynamic_batch(&[3, 5, 9]), "x")
        .unwrap();
    let pooled = x.max_pool2d((2, 2), (2, 2)).unwrap();
    assert_eq!(
        pooled.value_expected_shape().unwrap(),
        DynamicShape::new(&[None, Some(3), Some(2), Some(4)])
    );
}
