use super::{TraitNode, leaf_node_error};
use crate::nn::GraphError;
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;

/// 输入节点（占位符）：值在每个训练步由外部喂入，不参与梯度计算
pub(crate) struct Input {
    shape: DynamicShape,
}

impl Input {
    pub(crate) const fn new(shape: DynamicShape) -> Self {
        Self { shape }
    }
}

impl TraitNode for Input {
    fn type_name(&self) -> &'static str {
        "Input"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, _: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        Err(leaf_node_error(self.type_name()))
    }

    fn calc_grad_to_parent(&self, _: usize, _: &[&Tensor], _: &Tensor) -> Result<Tensor, GraphError> {
        Err(leaf_node_error(self.type_name()))
    }

    fn accepts_manual_value(&self) -> bool {
        true
    }
}
