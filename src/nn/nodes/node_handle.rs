/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 节点句柄：在原始节点（算子）之外统一管理节点的id、名称、值、梯度与detach状态
 */

use super::raw_node::{NodeType, TraitNode};
use crate::nn::GraphError;
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct NodeHandle {
    id: NodeId,
    name: String,
    raw_node: NodeType,
    value: Option<Tensor>,
    grad: Option<Tensor>,
    /// 被detach的节点照常计算值，但梯度不会经由它流向其父节点
    is_detached: bool,
}

impl NodeHandle {
    pub(crate) fn new<T: Into<NodeType>>(id: NodeId, name: &str, raw_node: T) -> Self {
        Self {
            id,
            name: name.to_string(),
            raw_node: raw_node.into(),
            value: None,
            grad: None,
            is_detached: false,
        }
    }

    pub(crate) const fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn value_expected_shape(&self) -> &DynamicShape {
        self.raw_node.value_expected_shape()
    }

    pub(crate) const fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    pub(crate) const fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// 手动设置节点的值（仅输入、参数节点允许），值的形状须与节点的预期形状兼容
    pub(crate) fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        if !self.raw_node.accepts_manual_value() {
            return Err(GraphError::InvalidOperation(format!(
                "{self}的值由父节点计算得出，不应被手动设置"
            )));
        }
        if let Some(value) = value {
            self.check_shape(value)?;
        }
        self.value = value.cloned();
        Ok(())
    }

    /// 根据父节点的值计算本节点的值
    pub(crate) fn compute_value(
        &mut self,
        parents: &[&Tensor],
        is_train_mode: bool,
    ) -> Result<(), GraphError> {
        let value = self.raw_node.calc_value_by_parents(parents, is_train_mode)?;
        self.check_shape(&value)?;
        self.value = Some(value);
        Ok(())
    }

    pub(crate) fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        self.raw_node
            .calc_grad_to_parent(parent_index, parents, upstream_grad)
    }

    pub(crate) const fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    pub(crate) fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }

    /// 累加梯度（同一节点被多个子节点使用时）
    pub(crate) fn accumulate_grad(&mut self, grad: Tensor) {
        match &mut self.grad {
            Some(existing) => *existing += &grad,
            None => self.grad = Some(grad),
        }
    }

    pub(crate) const fn is_detached(&self) -> bool {
        self.is_detached
    }

    pub(crate) const fn set_detached(&mut self, detached: bool) {
        self.is_detached = detached;
    }

    pub(crate) fn is_trainable(&self) -> bool {
        self.raw_node.is_trainable()
    }

    pub(crate) fn set_trainable(&mut self, trainable: bool) -> Result<(), GraphError> {
        self.raw_node.set_trainable(trainable)
    }

    pub(crate) const fn is_parameter(&self) -> bool {
        matches!(self.raw_node, NodeType::Parameter(_))
    }

    pub(crate) const fn is_input(&self) -> bool {
        matches!(self.raw_node, NodeType::Input(_))
    }

    fn check_shape(&self, value: &Tensor) -> Result<(), GraphError> {
        let expected = self.value_expected_shape();
        if expected.is_compatible_with_tensor(value.shape()) {
            Ok(())
        } else {
            Err(GraphError::ShapeMismatch {
                expected: expected.clone(),
                got: DynamicShape::fixed(value.shape()),
                message: format!("{self}的值与其预期形状不符"),
            })
        }
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "节点[id={}, name={}, type={}]",
            self.id,
            self.name,
            self.raw_node.type_name()
        )
    }
}
