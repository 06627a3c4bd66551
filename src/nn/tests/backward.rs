use crate::assert_err;
use crate::nn::{Graph, GraphError, Init};
use crate::tensor::Tensor;

/// 构造 x --conv(w1)--> h --conv(w2)--> 损失 的两层小网络
fn two_layer_net(graph: &Graph) -> (crate::nn::Var, crate::nn::Var, crate::nn::Var, crate::nn::Var) {
    let x = graph
        .input(&Tensor::new(&[1., -1., 2., 0.5], &[1, 1, 2, 2]))
        .unwrap();
    let w1 = graph
        .parameter(&[2, 1, 1, 1], Init::Normal { mean: 0.0, std: 1.0 }, "w1")
        .unwrap();
    let w2 = graph
        .parameter(&[2, 2, 1, 1], Init::Normal { mean: 0.0, std: 1.0 }, "w2")
        .unwrap();
    let h = x.conv2d(&w1, (1, 1), (0, 0)).unwrap();
    let labels = graph
        .input(&Tensor::new(&[1., 0., 0., 1., 1., 0., 0., 1.], &[4, 2]))
        .unwrap();
    let loss = h
        .conv2d(&w2, (1, 1), (0, 0))
        .unwrap()
        .flatten_pixels()
        .unwrap()
        .softmax_cross_entropy(&labels)
        .unwrap();
    (h, w1, w2, loss)
}

#[test]
fn test_backward_reaches_all_trainable_parameters() {
    let graph = Graph::new_with_seed(1);
    let (_, w1, w2, loss) = two_layer_net(&graph);
    loss.backward().unwrap();
    assert!(w1.grad().unwrap().is_some());
    assert!(w2.grad().unwrap().is_some());
}

#[test]
fn test_detach_blocks_gradient_to_upstream() {
    let graph = Graph::new_with_seed(1);
    let (h, w1, w2, loss) = two_layer_net(&graph);
    h.detach().unwrap();
    assert!(h.is_detached().unwrap());
    loss.backward().unwrap();
    assert!(w1.grad().unwrap().is_none());
    assert!(w2.grad().unwrap().is_some());
}

#[test]
fn test_frozen_parameter_gets_no_gradient() {
    let graph = Graph::new_with_seed(1);
    let (_, w1, w2, loss) = two_layer_net(&graph);
    w1.set_trainable(false).unwrap();
    loss.backward().unwrap();
    assert!(w1.grad().unwrap().is_none());
    assert!(w2.grad().unwrap().is_some());
    assert_eq!(graph.inner().get_trainable_nodes(), vec![w2.node_id()]);
}

#[test]
fn test_grad_accumulates_until_zero_grad() {
    let graph = Graph::new_with_seed(1);
    let (_, _, w2, loss) = two_layer_net(&graph);
    loss.backward().unwrap();
    let once = w2.grad().unwrap().unwrap();
    loss.backward().unwrap();
    let twice = w2.grad().unwrap().unwrap();
    for (a, b) in once.data_as_slice().iter().zip(twice.data_as_slice()) {
        assert!((a * 2. - b).abs() < 1e-6);
    }
    graph.zero_grad();
    assert!(w2.grad().unwrap().is_none());
}

#[test]
fn test_input_node_has_no_grad() {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 1])).unwrap();
    assert_err!(x.grad(), GraphError::InvalidOperation(_));
}

#[test]
fn test_backward_requires_scalar_loss() {
    let graph = Graph::new_with_seed(1);
    let w = graph
        .parameter(&[1, 1, 2, 2], Init::Normal { mean: 0.0, std: 1.0 }, "w")
        .unwrap();
    let y = w.relu().unwrap();
    assert_err!(y.backward(), GraphError::InvalidOperation(_));
}

#[test]
fn test_shared_node_grad_is_summed() {
    // loss(w + w) 对 w 的梯度是 loss(z) 对 z 梯度的2倍
    let graph = Graph::new_with_seed(1);
    let w = graph
        .parameter(&[1, 2, 1, 1], Init::Normal { mean: 0.0, std: 1.0 }, "w")
        .unwrap();
    let doubled = w.add(&w).unwrap();
    let labels = graph.input(&Tensor::new(&[0., 1.], &[1, 2])).unwrap();
    let loss = doubled
        .flatten_pixels()
        .unwrap()
        .softmax_cross_entropy(&labels)
        .unwrap();
    loss.backward().unwrap();
    let grad = w.grad().unwrap().unwrap();

    let z = doubled.value().unwrap().unwrap();
    let max = z.data_as_slice()[0].max(z.data_as_slice()[1]);
    let exp = z.map(|v| (v - max).exp());
    let softmax1 = exp.data_as_slice()[1] / exp.sum();
    // d loss / d z1 = softmax1 - 1
    assert!((grad.data_as_slice()[1] - 2. * (softmax1 - 1.)).abs() < 1e-5);
}
