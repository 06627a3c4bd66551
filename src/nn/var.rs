/*
 * @Author       : 老董
 * @Date         : 2026-01-08
 * @Description  : Var - 变量句柄，携带图引用，支持链式调用
 */

use super::graph::{Graph, GraphInner};
use super::shape::DynamicShape;
use super::{GraphError, NodeId};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;

// ==================== Init 枚举 ====================

/// 参数初始化策略
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// 正态分布
    Normal { mean: f32, std: f32 },
    /// 截断正态分布：落在均值两个标准差以外的样本重新采样
    TruncatedNormal { mean: f32, std: f32 },
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG）
    pub fn generate_with_rng(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::full(*v, shape),
            Self::Zeros => Tensor::zeros(shape),
            Self::Normal { mean, std } => Tensor::normal_with_rng(*mean, *std, shape, rng),
            Self::TruncatedNormal { mean, std } => {
                Tensor::truncated_normal_with_rng(*mean, *std, shape, rng)
            }
        }
    }
}

// ==================== Var 结构 ====================

/// 变量句柄 - 持有图引用，可直接链式建图
///
/// # 使用示例
/// ```ignore
/// let graph = Graph::new();
/// let x = graph.placeholder(DynamicShape::with_dynamic_batch(&[3, 32, 32]), "x")?;
/// let h = x.conv2d(&kernel, (1, 1), (1, 1))?.relu()?;
/// let loss = h.flatten_pixels()?.softmax_cross_entropy(&labels)?;
/// loss.backward()?;
/// ```
#[derive(Clone)]
pub struct Var {
    id: NodeId,
    graph: Rc<RefCell<GraphInner>>,
}

impl std::fmt::Debug for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var").field("id", &self.id).finish()
    }
}

impl Var {
    pub(crate) const fn new(id: NodeId, graph: Rc<RefCell<GraphInner>>) -> Self {
        Self { id, graph }
    }

    pub const fn node_id(&self) -> NodeId {
        self.id
    }

    /// 检查两个 Var 是否来自同一个 Graph
    pub fn same_graph(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    /// 获取 Var 所属的 Graph 句柄
    pub fn get_graph(&self) -> Graph {
        Graph::from_rc(Rc::clone(&self.graph))
    }

    pub fn name(&self) -> Result<String, GraphError> {
        Ok(self.graph.borrow().get_node_name(self.id)?.to_string())
    }

    /// 获取节点的预期输出形状（建图时就已确定，动态维度为None）
    pub fn value_expected_shape(&self) -> Result<DynamicShape, GraphError> {
        Ok(self
            .graph
            .borrow()
            .get_node_value_expected_shape(self.id)?
            .clone())
    }

    fn check_same_graph(&self, other: &Self) -> Result<(), GraphError> {
        if self.same_graph(other) {
            Ok(())
        } else {
            Err(GraphError::InvalidOperation(
                "不能对来自不同 Graph 的 Var 进行操作".to_string(),
            ))
        }
    }

    /// 用图内部的某个节点构建方法创建新节点，并包装为Var
    fn derive(
        &self,
        build: impl FnOnce(&mut GraphInner) -> Result<NodeId, GraphError>,
    ) -> Result<Self, GraphError> {
        let id = build(&mut self.graph.borrow_mut())?;
        Ok(Self::new(id, Rc::clone(&self.graph)))
    }

    // ==================== 梯度流控制 ====================

    /// 截断梯度流：本节点照常计算，但梯度不再流向其上游
    pub fn detach(&self) -> Result<Self, GraphError> {
        self.graph.borrow_mut().detach_node(self.id)?;
        Ok(self.clone())
    }

    pub fn is_detached(&self) -> Result<bool, GraphError> {
        self.graph.borrow().is_node_detached(self.id)
    }

    pub fn is_trainable(&self) -> Result<bool, GraphError> {
        self.graph.borrow().is_node_trainable(self.id)
    }

    pub fn set_trainable(&self, trainable: bool) -> Result<(), GraphError> {
        self.graph.borrow_mut().set_node_trainable(self.id, trainable)
    }

    // ==================== 执行 ====================

    pub fn forward(&self) -> Result<(), GraphError> {
        self.graph.borrow_mut().forward(self.id)
    }

    /// 反向传播（ensure-forward 语义：先执行前向传播），返回损失的标量值
    pub fn backward(&self) -> Result<f32, GraphError> {
        let mut g = self.graph.borrow_mut();
        g.forward(self.id)?;
        g.backward(self.id)
    }

    // ==================== 值访问和设置 ====================

    /// 获取节点的值（克隆的 Tensor）
    pub fn value(&self) -> Result<Option<Tensor>, GraphError> {
        Ok(self.graph.borrow().get_node_value(self.id)?.cloned())
    }

    /// 为输入或参数节点设置值（形状须与预期形状兼容）
    pub fn feed(&self, value: &Tensor) -> Result<(), GraphError> {
        self.graph.borrow_mut().set_node_value(self.id, Some(value))
    }

    pub fn grad(&self) -> Result<Option<Tensor>, GraphError> {
        Ok(self.graph.borrow().get_node_grad(self.id)?.cloned())
    }

    // ==================== 算子 ====================

    /// 逐元素相加，两者形状须严格一致
    pub fn add(&self, other: &Self) -> Result<Self, GraphError> {
        self.check_same_graph(other)?;
        self.derive(|g| g.new_add_node(&[self.id, other.id], None))
    }

    pub fn relu(&self) -> Result<Self, GraphError> {
        self.leaky_relu(0.0)
    }

    pub fn leaky_relu(&self, alpha: f32) -> Result<Self, GraphError> {
        self.derive(|g| g.new_leaky_relu_node(self.id, alpha, None))
    }

    pub fn conv2d(
        &self,
        kernel: &Self,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, GraphError> {
        self.check_same_graph(kernel)?;
        self.derive(|g| g.new_conv2d_node(self.id, kernel.id, stride, padding, None))
    }

    /// "same"模式转置卷积：输出空间尺寸为输入的stride倍
    pub fn conv_transpose2d(&self, kernel: &Self, stride: (usize, usize)) -> Result<Self, GraphError> {
        self.check_same_graph(kernel)?;
        self.derive(|g| g.new_conv_transpose2d_node(self.id, kernel.id, stride, None))
    }

    pub fn channel_bias_add(&self, bias: &Self) -> Result<Self, GraphError> {
        self.check_same_graph(bias)?;
        self.derive(|g| g.new_channel_bias_add_node(self.id, bias.id, None))
    }

    pub fn max_pool2d(&self, kernel: (usize, usize), stride: (usize, usize)) -> Result<Self, GraphError> {
        self.derive(|g| g.new_max_pool2d_node(self.id, kernel, stride, None))
    }

    /// `keep_prob`为形状[1, 1]的输入节点
    pub fn dropout(&self, keep_prob: &Self) -> Result<Self, GraphError> {
        self.check_same_graph(keep_prob)?;
        self.derive(|g| g.new_dropout_node(self.id, keep_prob.id, None))
    }

    /// [N, C, H, W] -> [N·H·W, C]
    pub fn flatten_pixels(&self) -> Result<Self, GraphError> {
        self.derive(|g| g.new_flatten_pixels_node(self.id, None))
    }

    /// 以自身为logits、`labels`为one-hot标签的平均softmax交叉熵
    pub fn softmax_cross_entropy(&self, labels: &Self) -> Result<Self, GraphError> {
        self.check_same_graph(labels)?;
        self.derive(|g| g.new_softmax_cross_entropy_node(self.id, labels.id, None))
    }
}
