use super::{TraitNode, leaf_node_error};
use crate::nn::GraphError;
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;

/// 参数节点：形状固定；`trainable`为false时（如冻结的骨干网络权重）不会收到梯度
pub(crate) struct Parameter {
    shape: DynamicShape,
    trainable: bool,
}

impl Parameter {
    pub(crate) fn new(shape: &[usize], trainable: bool) -> Self {
        Self {
            shape: DynamicShape::fixed(shape),
            trainable,
        }
    }
}

impl TraitNode for Parameter {
    fn type_name(&self) -> &'static str {
        "Parameter"
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

    fn is_trainable(&self) -> bool {
        self.trainable
    }

    fn set_trainable(&mut self, trainable: bool) -> Result<(), GraphError> {
        self.trainable = trainable;
        Ok(())
    }
}
