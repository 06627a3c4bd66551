use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;

/// 逐元素相加。所有父节点的形状必须严格一致，不做任何广播
pub(crate) struct Add {
    parents_count: usize,
    shape: DynamicShape,
}

impl Add {
    pub(crate) fn new(parents: &[&DynamicShape]) -> Result<Self, GraphError> {
        // 1. 父节点数量验证
        if parents.len() < 2 {
            return Err(GraphError::InvalidOperation(
                "Add节点至少需要2个父节点".to_string(),
            ));
        }

        // 2. 验证所有父节点形状相同
        let shape = parents[0].clone();
        for parent in parents.iter().skip(1) {
            if !parent.is_compatible(&shape) {
                return Err(GraphError::ShapeMismatch {
                    expected: shape,
                    got: (*parent).clone(),
                    message: "Add节点的所有父节点形状必须相同".to_string(),
                });
            }
        }

        Ok(Self {
            parents_count: parents.len(),
            shape,
        })
    }
}

impl TraitNode for Add {
    fn type_name(&self) -> &'static str {
        "Add"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let mut sum = parents[0].clone();
        for parent in &parents[1..] {
            // 动态维度在运行时才能确定，这里再次严格校验
            if !parent.is_same_shape(&sum) {
                return Err(GraphError::ShapeMismatch {
                    expected: DynamicShape::fixed(sum.shape()),
                    got: DynamicShape::fixed(parent.shape()),
                    message: "Add节点的所有父节点形状必须相同".to_string(),
                });
            }
            sum += parent;
        }
        Ok(sum)
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index >= self.parents_count {
            return Err(parent_index_error(self.type_name(), parent_index));
        }
        Ok(upstream_grad.clone())
    }
}
