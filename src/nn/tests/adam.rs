use crate::nn::optimizer::{Adam, Optimizer};
use crate::nn::{Graph, Init};
use crate::tensor::Tensor;

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    let graph = Graph::new_with_seed(3);
    let w = graph
        .parameter(&[1, 2, 1, 1], Init::Normal { mean: 0.0, std: 1.0 }, "w")
        .unwrap();
    let labels = graph.input(&Tensor::new(&[0., 1.], &[1, 2])).unwrap();
    let loss = w
        .flatten_pixels()
        .unwrap()
        .softmax_cross_entropy(&labels)
        .unwrap();

    let lr = 0.01;
    let mut adam = Adam::new_default(&[w.clone()], lr);
    let before = w.value().unwrap().unwrap();
    loss.backward().unwrap();
    let grad = w.grad().unwrap().unwrap();
    adam.step().unwrap();
    assert_eq!(adam.steps(), 1);

    // 第一步偏差修正后 m_hat = g，v_hat = g²，更新量约为 lr * sign(g)
    let after = w.value().unwrap().unwrap();
    for ((b, a), g) in before
        .data_as_slice()
        .iter()
        .zip(after.data_as_slice())
        .zip(grad.data_as_slice())
    {
        let expected = b - lr * g / (g.abs() + 1e-8);
        assert!((a - expected).abs() < 1e-5, "{a} vs {expected}");
    }
}

#[test]
fn test_adam_only_updates_its_parameter_group() {
    let graph = Graph::new_with_seed(3);
    let w1 = graph
        .parameter(&[1, 2, 1, 1], Init::Normal { mean: 0.0, std: 1.0 }, "w1")
        .unwrap();
    let w2 = graph
        .parameter(&[1, 2, 1, 1], Init::Normal { mean: 0.0, std: 1.0 }, "w2")
        .unwrap();
    let labels = graph.input(&Tensor::new(&[1., 0.], &[1, 2])).unwrap();
    let loss = w1
        .add(&w2)
        .unwrap()
        .flatten_pixels()
        .unwrap()
        .softmax_cross_entropy(&labels)
        .unwrap();

    let mut adam = Adam::new_default(&[w1.clone()], 0.1);
    let w1_before = w1.value().unwrap().unwrap();
    let w2_before = w2.value().unwrap().unwrap();
    let first = loss.backward().unwrap();
    adam.step().unwrap();
    adam.zero_grad().unwrap();
    assert!(w1.grad().unwrap().is_none());

    assert_ne!(w1.value().unwrap().unwrap(), w1_before);
    assert_eq!(w2.value().unwrap().unwrap(), w2_before);

    let second = loss.backward().unwrap();
    assert!(second < first);
}

#[test]
fn test_adam_learning_rate_and_reset() {
    let graph = Graph::new();
    let w = graph.parameter(&[1, 1], Init::Zeros, "w").unwrap();
    let mut adam = Adam::new_default(&[w], 1e-4);
    assert_eq!(adam.learning_rate(), 1e-4);
    adam.set_learning_rate(1e-3);
    assert_eq!(adam.learning_rate(), 1e-3);
    // 无梯度的参数不被更新，但步数照常递增
    adam.step().unwrap();
    assert_eq!(adam.steps(), 1);
    adam.reset();
    assert_eq!(adam.steps(), 0);
}
