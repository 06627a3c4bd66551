use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_ndim, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;

/// 把NCHW的逐像素得分图展平为[N·H·W, C]的二维矩阵（先转为NHWC再展平），
/// 使每一行对应一个像素、每一列对应一个类别
pub(crate) struct FlattenPixels {
    shape: DynamicShape,
}

impl FlattenPixels {
    pub(crate) fn new(parents: &[&DynamicShape]) -> Result<Self, GraphError> {
        check_parents_count("FlattenPixels", parents, 1)?;
        let input = parents[0];
        check_ndim("FlattenPixels", input, 4)?;
        let rows = [0, 2, 3]
            .iter()
            .map(|&i| input.dim(i))
            .product::<Option<usize>>();
        Ok(Self {
            shape: DynamicShape::new(&[rows, input.dim(1)]),
        })
    }
}

impl TraitNode for FlattenPixels {
    fn type_name(&self) -> &'static str {
        "FlattenPixels"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let shape = parents[0].shape();
        let rows = shape[0] * shape[2] * shape[3];
        Ok(parents[0].permute(&[0, 2, 3, 1]).reshape(&[rows, shape[1]]))
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
        let shape = parents[0].shape();
        Ok(upstream_grad
            .reshape(&[shape[0], shape[2], shape[3], shape[1]])
            .permute(&[0, 3, 1, 2]))
    }
}
