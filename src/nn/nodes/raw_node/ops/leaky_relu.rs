use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;

/// LeakyReLU：x > 0 时为 x，否则为 alpha * x；alpha = 0 即标准ReLU
pub(crate) struct LeakyReLU {
    alpha: f32,
    shape: DynamicShape,
}

impl LeakyReLU {
    pub(crate) fn new(parents: &[&DynamicShape], alpha: f32) -> Result<Self, GraphError> {
        check_parents_count("LeakyReLU", parents, 1)?;
        if !(0.0..1.0).contains(&alpha) {
            return Err(GraphError::InvalidOperation(format!(
                "LeakyReLU的alpha须在[0, 1)之间，实际为{alpha}"
            )));
        }
        Ok(Self {
            alpha,
            shape: parents[0].clone(),
        })
    }
}

impl TraitNode for LeakyReLU {
    fn type_name(&self) -> &'static str {
        "LeakyReLU"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let alpha = self.alpha;
        Ok(parents[0].map(|x| if x > 0.0 { x } else { alpha * x }))
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(parent_index_error(self.type_name(), parent_index));
        }
        let alpha = self.alpha;
        let slope = parents[0].map(|x| if x > 0.0 { 1.0 } else { alpha });
        Ok(upstream_grad * &slope)
    }
}
