/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : Dropout节点：父节点为[输入, 保留概率keep_prob（形状[1, 1]的输入节点）]。
 *                 训练模式下每个元素以keep_prob的概率保留并放大1/keep_prob倍，否则置0；
 *                 评估模式下（或keep_prob为1时）原样输出。
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use rand::Rng;
use rand::rngs::StdRng;

pub(crate) struct Dropout {
    shape: DynamicShape,
    rng: StdRng,
    /// 最近一次前向传播使用的缩放掩码；None表示未做dropout
    mask: Option<Tensor>,
}

impl Dropout {
    pub(crate) fn new(parents: &[&DynamicShape], rng: StdRng) -> Result<Self, GraphError> {
        check_parents_count("Dropout", parents, 2)?;
        if parents[1].to_vec_fixed().is_none_or(|shape| shape.iter().product::<usize>() != 1) {
            return Err(GraphError::ShapeMismatch {
                expected: DynamicShape::fixed(&[1, 1]),
                got: parents[1].clone(),
                message: "Dropout的keep_prob必须是标量".to_string(),
            });
        }
        Ok(Self {
            shape: parents[0].clone(),
            rng,
            mask: None,
        })
    }
}

impl TraitNode for Dropout {
    fn type_name(&self) -> &'static str {
        "Dropout"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(
        &mut self,
        parents: &[&Tensor],
        is_train_mode: bool,
    ) -> Result<Tensor, GraphError> {
        let input = parents[0];
        let keep_prob = parents[1].number().ok_or_else(|| {
            GraphError::ComputationError("Dropout的keep_prob必须是标量".to_string())
        })?;
        if !(keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(GraphError::ComputationError(format!(
                "Dropout的keep_prob须在(0, 1]之间，实际为{keep_prob}"
            )));
        }

        if !is_train_mode || keep_prob >= 1.0 {
            self.mask = None;
            return Ok(input.clone());
        }

        let scale = 1.0 / keep_prob;
        let rng = &mut self.rng;
        let mask = input.map(|_| if rng.gen_bool(f64::from(keep_prob)) { scale } else { 0.0 });
        let output = input * &mask;
        self.mask = Some(mask);
        Ok(output)
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        match parent_index {
            0 => Ok(match &self.mask {
                Some(mask) => upstream_grad * mask,
                None => upstream_grad.clone(),
            }),
            _ => Err(parent_index_error(self.type_name(), parent_index)),
        }
    }
}
