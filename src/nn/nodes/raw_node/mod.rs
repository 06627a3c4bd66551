/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 原始节点：每种算子只关心自身的前向计算与对各父节点的VJP（向量-雅可比积）
 */

mod input;
mod loss;
mod ops;
mod parameter;

pub(crate) use input::Input;
pub(crate) use loss::*;
pub(crate) use ops::*;
pub(crate) use parameter::Parameter;

use crate::nn::GraphError;
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub(crate) enum NodeType {
    Input(Input),
    Parameter(Parameter),
    Add(Add),
    ChannelBiasAdd(ChannelBiasAdd),
    Conv2d(Conv2d),
    ConvTranspose2d(ConvTranspose2d),
    Dropout(Dropout),
    FlattenPixels(FlattenPixels),
    LeakyReLU(LeakyReLU),
    MaxPool2d(MaxPool2d),
    SoftmaxCrossEntropy(SoftmaxCrossEntropy),
}

#[enum_dispatch(NodeType)]
pub(crate) trait TraitNode {
    fn type_name(&self) -> &'static str;

    /// 节点值的预期形状（建图时即确定，动态维度用None表示）
    fn value_expected_shape(&self) -> &DynamicShape;

    // 根据父节点的值计算本节点的值（图保证调用前所有父节点都已有值）
    fn calc_value_by_parents(
        &mut self,
        parents: &[&Tensor],
        is_train_mode: bool,
    ) -> Result<Tensor, GraphError>;

    /// 给定本节点的上游梯度，计算对第`parent_index`个父节点的梯度（VJP）
    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError>;

    /// 该节点的值是否允许被手动设置（输入、参数节点）
    fn accepts_manual_value(&self) -> bool {
        false
    }

    /// 返回该节点的参数是否应该在训练过程中被更新
    fn is_trainable(&self) -> bool {
        false
    }

    fn set_trainable(&mut self, _trainable: bool) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}节点没有可训练参数",
            self.type_name()
        )))
    }
}

/// 父节点数量校验（供各节点的构造函数使用）
pub(crate) fn check_parents_count(
    type_name: &str,
    parents: &[&DynamicShape],
    expected: usize,
) -> Result<(), GraphError> {
    if parents.len() == expected {
        Ok(())
    } else {
        Err(GraphError::InvalidOperation(format!(
            "{type_name}节点需要{expected}个父节点，实际为{}个",
            parents.len()
        )))
    }
}

/// 父节点维数校验
pub(crate) fn check_ndim(
    type_name: &str,
    shape: &DynamicShape,
    expected: usize,
) -> Result<(), GraphError> {
    if shape.ndim() == expected {
        Ok(())
    } else {
        Err(GraphError::DimensionMismatch {
            expected,
            got: shape.ndim(),
            message: format!("{type_name}节点的输入形状为{shape}"),
        })
    }
}

/// 叶子节点（输入、参数）不会由父节点计算
pub(crate) fn leaf_node_error(type_name: &str) -> GraphError {
    GraphError::ComputationError(format!(
        "{type_name}节点是叶子节点，其值不该由父节点计算。不该触及本错误，否则说明crate代码有问题"
    ))
}

/// 请求了不存在的父节点下标
pub(crate) fn parent_index_error(type_name: &str, parent_index: usize) -> GraphError {
    GraphError::ComputationError(format!(
        "{type_name}节点没有第{parent_index}个父节点。不该触及本错误，否则说明crate代码有问题"
    ))
}
