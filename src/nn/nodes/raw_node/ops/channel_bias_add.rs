use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_ndim, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use ndarray::Axis;

/// 按通道加偏置：输入[N, C, H, W] + 偏置[1, C]（偏置在N、H、W上广播）
pub(crate) struct ChannelBiasAdd {
    shape: DynamicShape,
}

impl ChannelBiasAdd {
    pub(crate) fn new(parents: &[&DynamicShape]) -> Result<Self, GraphError> {
        check_parents_count("ChannelBiasAdd", parents, 2)?;
        let (input, bias) = (parents[0], parents[1]);
        check_ndim("ChannelBiasAdd", input, 4)?;
        let expected_bias = DynamicShape::new(&[Some(1), input.dim(1)]);
        if !bias.is_compatible(&expected_bias) {
            return Err(GraphError::ShapeMismatch {
                expected: expected_bias,
                got: bias.clone(),
                message: "ChannelBiasAdd的偏置形状须为[1, C]".to_string(),
            });
        }
        Ok(Self {
            shape: input.clone(),
        })
    }
}

impl TraitNode for ChannelBiasAdd {
    fn type_name(&self) -> &'static str {
        "ChannelBiasAdd"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let (input, bias) = (parents[0], parents[1]);
        let channels = bias.shape()[1];
        let bias = bias
            .view()
            .into_shape((1, channels, 1, 1))
            .map_err(|e| GraphError::ComputationError(format!("偏置变形失败：{e}")))?;
        Ok(Tensor::from_array(&input.view() + &bias.into_dyn()))
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        match parent_index {
            0 => Ok(upstream_grad.clone()),
            // 偏置梯度：在N、H、W上求和
            1 => {
                let channels = parents[1].shape()[1];
                let summed = upstream_grad
                    .view()
                    .sum_axis(Axis(3))
                    .sum_axis(Axis(2))
                    .sum_axis(Axis(0));
                let grad = summed
                    .into_shape(vec![1, channels])
                    .map_err(|e| GraphError::ComputationError(format!("偏置梯度变形失败：{e}")))?;
                Ok(Tensor::from_array(grad))
            }
            _ => Err(parent_index_error(self.type_name(), parent_index)),
        }
    }
}
