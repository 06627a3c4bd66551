/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : GraphInner VJP 反向传播
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::tensor::Tensor;
use std::collections::HashSet;

impl GraphInner {
    /// 反向传播：要求损失节点已完成前向传播且为标量。
    /// 可训练参数的梯度会累加（直到`clear_grad`），中间节点的梯度在结束后释放。
    pub fn backward(&mut self, loss: NodeId) -> Result<f32, GraphError> {
        let loss_node = self.get_node(loss)?;
        let loss_value = loss_node.value().ok_or_else(|| {
            GraphError::ComputationError(format!("损失{loss_node}没有值，请先执行 forward"))
        })?;
        if loss_value.size() != 1 {
            return Err(GraphError::InvalidOperation(format!(
                "反向传播要求损失为标量 [1, 1]，但得到 {:?}",
                loss_value.shape()
            )));
        }
        let loss_scalar = loss_value.data_as_slice()[0];
        let loss_grad = Tensor::ones(loss_value.shape());

        if !self.is_train_mode() {
            tracing::warn!("在评估模式下调用 backward，这通常是误用");
        }

        let order = self.topological_order(loss)?;
        let needs_grad = self.nodes_needing_grad(&order)?;
        if !needs_grad.contains(&loss) {
            tracing::warn!("损失节点{loss}不依赖任何可训练参数，跳过反向传播");
            return Ok(loss_scalar);
        }

        // 上次反向传播若中途出错，可能残留中间梯度
        self.release_intermediate_grads(&order)?;
        self.get_node_mut(loss)?.set_grad(Some(&loss_grad));

        for &node_id in order.iter().rev() {
            let grads = self.grads_to_parents(node_id, &needs_grad)?;
            for (parent_id, grad) in grads {
                self.get_node_mut(parent_id)?.accumulate_grad(grad);
            }
        }

        self.release_intermediate_grads(&order)?;
        self.last_backward_pass_id += 1;
        Ok(loss_scalar)
    }

    /// 需要梯度的节点：可训练参数，以及至少有一个父节点需要梯度且未被detach的运算节点
    fn nodes_needing_grad(&self, order: &[NodeId]) -> Result<HashSet<NodeId>, GraphError> {
        let mut needs_grad = HashSet::new();
        for &id in order {
            let node = self.get_node(id)?;
            let needs = if node.is_parameter() {
                node.is_trainable()
            } else if node.is_input() || node.is_detached() {
                false
            } else {
                self.get_node_parents(id)?
                    .iter()
                    .any(|parent| needs_grad.contains(parent))
            };
            if needs {
                needs_grad.insert(id);
            }
        }
        Ok(needs_grad)
    }

    /// 计算本节点对每个需要梯度的父节点的梯度
    fn grads_to_parents(
        &self,
        node_id: NodeId,
        needs_grad: &HashSet<NodeId>,
    ) -> Result<Vec<(NodeId, Tensor)>, GraphError> {
        let node = self.get_node(node_id)?;
        if node.is_parameter() || !needs_grad.contains(&node_id) {
            return Ok(Vec::new());
        }
        let Some(upstream_grad) = node.grad() else {
            return Ok(Vec::new());
        };

        let parent_ids = self.get_node_parents(node_id)?;
        let parents = Self::collect_values(&self.nodes, &parent_ids)?;
        let mut grads = Vec::new();
        for (index, parent_id) in parent_ids.iter().enumerate() {
            if needs_grad.contains(parent_id) {
                let grad = node.calc_grad_to_parent(index, &parents, upstream_grad)?;
                grads.push((*parent_id, grad));
            }
        }
        Ok(grads)
    }

    /// 释放本次反向传播中非参数节点的梯度
    fn release_intermediate_grads(&mut self, order: &[NodeId]) -> Result<(), GraphError> {
        for &id in order {
            let node = self.get_node_mut(id)?;
            if !node.is_parameter() {
                node.set_grad(None);
            }
        }
        Ok(())
    }

    /// 清零所有节点的梯度
    pub fn clear_grad(&mut self) {
        for node in self.nodes.values_mut() {
            node.set_grad(None);
        }
    }
}
