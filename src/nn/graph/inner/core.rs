/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : GraphInner 核心操作 + 前向传播
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use crate::nn::shape::DynamicShape;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};

impl GraphInner {
    // ========== 创建 ==========

    pub fn new() -> Self {
        Self::with_name_and_rng("default_graph", StdRng::from_entropy())
    }

    /// 创建一个带固定种子的计算图（确保可重复性）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_name_and_rng("default_graph", StdRng::seed_from_u64(seed))
    }

    pub fn with_name(name: &str) -> Self {
        Self::with_name_and_rng(name, StdRng::from_entropy())
    }

    fn with_name_and_rng(name: &str, rng: StdRng) -> Self {
        Self {
            name: name.to_string(),
            nodes: HashMap::new(),
            backward_edges: HashMap::new(),
            last_forward_pass_id: 0,
            last_backward_pass_id: 0,
            next_id: 0,
            is_eval_mode: false,
            rng,
        }
    }

    // ========== 基础访问器 ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub const fn last_forward_pass_id(&self) -> u64 {
        self.last_forward_pass_id
    }

    pub const fn last_backward_pass_id(&self) -> u64 {
        self.last_backward_pass_id
    }

    /// 设置/重置图的随机种子
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub(in crate::nn) const fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// 从图的随机数生成器派生一个独立的生成器（供dropout等节点持有）
    pub(in crate::nn) fn fork_rng(&mut self) -> StdRng {
        StdRng::from_rng(&mut self.rng).unwrap_or_else(|_| StdRng::from_entropy())
    }

    pub(in crate::nn) fn get_node(&self, id: NodeId) -> Result<&NodeHandle, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_node_mut(&mut self, id: NodeId) -> Result<&mut NodeHandle, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn get_node_parents(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        // 先检查节点是否存在
        let _ = self.get_node(id)?;
        Ok(self.backward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn get_node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(self.get_node(id)?.name())
    }

    /// 按名称查找节点
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|node| node.name() == name)
            .map(NodeHandle::id)
    }

    pub fn get_node_value(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.value())
    }

    pub fn set_node_value(&mut self, id: NodeId, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_value(value)
    }

    pub fn get_node_value_expected_shape(&self, id: NodeId) -> Result<&DynamicShape, GraphError> {
        Ok(self.get_node(id)?.value_expected_shape())
    }

    pub fn get_node_grad(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        let node = self.get_node(id)?;
        // 输入节点不应该有梯度
        if node.is_input() {
            return Err(GraphError::InvalidOperation(format!(
                "输入{node}不应该有梯度"
            )));
        }
        Ok(node.grad())
    }

    pub fn is_node_trainable(&self, id: NodeId) -> Result<bool, GraphError> {
        Ok(self.get_node(id)?.is_trainable())
    }

    pub fn set_node_trainable(&mut self, id: NodeId, trainable: bool) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_trainable(trainable)
    }

    /// 获取图中所有可训练的参数节点（按创建顺序）
    pub fn get_trainable_nodes(&self) -> Vec<NodeId> {
        let mut ids = self
            .nodes
            .values()
            .filter(|node| node.is_parameter() && node.is_trainable())
            .map(NodeHandle::id)
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    /// 目标节点及其全部祖先的拓扑序（父节点总在子节点之前）
    pub(in crate::nn::graph) fn topological_order(
        &self,
        target: NodeId,
    ) -> Result<Vec<NodeId>, GraphError> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(target, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            let _ = self.get_node(id)?;
            stack.push((id, true));
            if let Some(parents) = self.backward_edges.get(&id) {
                for parent in parents.iter().rev() {
                    if !visited.contains(parent) {
                        stack.push((*parent, false));
                    }
                }
            }
        }
        Ok(order)
    }

    // ========== 前向传播 ==========

    /// 计算目标节点的值：按拓扑序重新计算其所有非叶子祖先
    pub fn forward(&mut self, target: NodeId) -> Result<(), GraphError> {
        let order = self.topological_order(target)?;
        let is_train_mode = self.is_train_mode();
        for id in order {
            let parent_ids = self.get_node_parents(id)?;
            if parent_ids.is_empty() {
                let node = self.get_node(id)?;
                if !node.has_value() {
                    return Err(GraphError::ComputationError(format!(
                        "{node}没有值，请在前向传播前为其赋值"
                    )));
                }
                continue;
            }

            // 暂时取出本节点，使其能可变借用的同时读取父节点的值
            let mut node = self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))?;
            let result = Self::collect_values(&self.nodes, &parent_ids)
                .and_then(|parents| node.compute_value(&parents, is_train_mode));
            self.nodes.insert(id, node);
            result?;
        }
        self.last_forward_pass_id += 1;
        Ok(())
    }

    pub(in crate::nn::graph) fn collect_values<'a>(
        nodes: &'a HashMap<NodeId, NodeHandle>,
        ids: &[NodeId],
    ) -> Result<Vec<&'a Tensor>, GraphError> {
        ids.iter()
            .map(|id| {
                let node = nodes.get(id).ok_or(GraphError::NodeNotFound(*id))?;
                node.value().ok_or_else(|| {
                    GraphError::ComputationError(format!(
                        "{node}没有值。不该触及本错误，否则说明crate代码有问题"
                    ))
                })
            })
            .collect()
    }
}
