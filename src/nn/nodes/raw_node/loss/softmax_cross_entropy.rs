/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : Softmax + 交叉熵的融合损失节点
 *                 父节点为[logits, labels]，两者形状均为[行数, 类别数]，每行是一个样本（像素）。
 *                 输出为所有行损失的均值，形状[1, 1]。
 *                 采用log-sum-exp的稳定形式：log_softmax(x) = x - max - ln(Σexp(x - max))，
 *                 避免先算softmax再取对数时的上溢与log(0)。
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_ndim, check_parents_count, parent_index_error};
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use ndarray::{Array2, ArrayView2, Ix2};

pub(crate) struct SoftmaxCrossEntropy {
    shape: DynamicShape,
    /// 最近一次前向传播得到的softmax概率，供反向传播复用
    softmax: Option<Array2<f32>>,
}

impl SoftmaxCrossEntropy {
    pub(crate) fn new(parents: &[&DynamicShape]) -> Result<Self, GraphError> {
        check_parents_count("SoftmaxCrossEntropy", parents, 2)?;
        let (logits, labels) = (parents[0], parents[1]);
        check_ndim("SoftmaxCrossEntropy", logits, 2)?;
        if !labels.is_compatible(logits) {
            return Err(GraphError::ShapeMismatch {
                expected: logits.clone(),
                got: labels.clone(),
                message: "SoftmaxCrossEntropy的labels形状须与logits一致".to_string(),
            });
        }
        Ok(Self {
            shape: DynamicShape::fixed(&[1, 1]),
            softmax: None,
        })
    }
}

fn as_matrix(tensor: &Tensor) -> Result<ArrayView2<'_, f32>, GraphError> {
    tensor
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|e| GraphError::ComputationError(format!("期望二维矩阵：{e}")))
}

/// 逐行计算log_softmax
fn log_softmax_rows(logits: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut result = logits.to_owned();
    for mut row in result.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
        let log_sum_exp = row.iter().map(|&x| (x - max).exp()).sum::<f32>().ln() + max;
        row.mapv_inplace(|x| x - log_sum_exp);
    }
    result
}

impl TraitNode for SoftmaxCrossEntropy {
    fn type_name(&self) -> &'static str {
        "SoftmaxCrossEntropy"
    }

    fn value_expected_shape(&self) -> &DynamicShape {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor], _: bool) -> Result<Tensor, GraphError> {
        let (logits, labels) = (as_matrix(parents[0])?, as_matrix(parents[1])?);
        if logits.shape() != labels.shape() {
            return Err(GraphError::ShapeMismatch {
                expected: DynamicShape::fixed(logits.shape()),
                got: DynamicShape::fixed(labels.shape()),
                message: "SoftmaxCrossEntropy的labels形状须与logits一致".to_string(),
            });
        }
        let rows = logits.nrows();
        if rows == 0 {
            return Err(GraphError::ComputationError(
                "SoftmaxCrossEntropy的输入没有任何行".to_string(),
            ));
        }

        let log_probs = log_softmax_rows(logits);
        let total = -(&log_probs * &labels).sum();
        self.softmax = Some(log_probs.mapv(f32::exp));
        Ok(Tensor::new(&[total / rows as f32], &[1, 1]))
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let upstream = upstream_grad.number().ok_or_else(|| {
            GraphError::ComputationError("SoftmaxCrossEntropy的上游梯度必须是标量".to_string())
        })?;
        let labels = as_matrix(parents[1])?;
        let scale = upstream / labels.nrows() as f32;
        match parent_index {
            // d/dlogits = (softmax - labels) / 行数
            0 => {
                let softmax = self.softmax.as_ref().ok_or_else(|| {
                    GraphError::ComputationError(
                        "SoftmaxCrossEntropy节点尚未执行前向传播".to_string(),
                    )
                })?;
                Ok(Tensor::from_array(((softmax - &labels) * scale).into_dyn()))
            }
            // d/dlabels = -log_softmax / 行数
            1 => {
                let log_probs = log_softmax_rows(as_matrix(parents[0])?);
                Ok(Tensor::from_array((log_probs * -scale).into_dyn()))
            }
            _ => Err(parent_index_error(self.type_name(), parent_index)),
        }
    }
}
