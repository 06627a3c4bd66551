/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : Graph 句柄（用户级 API）
 */

use super::error::GraphError;
use super::inner::GraphInner;
use crate::nn::NodeId;
use crate::nn::shape::DynamicShape;
use crate::nn::var::{Init, Var};
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Graph - 计算图句柄
///
/// # 设计原则
/// - 是 `Rc<RefCell<GraphInner>>` 的薄封装
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 创建的 Var 自动持有图引用
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Graph {
    // ==================== 创建 ====================

    pub fn new() -> Self {
        Self::from_inner(GraphInner::new())
    }

    /// 创建带种子的图（用于确定性训练）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::from_inner(GraphInner::new_with_seed(seed))
    }

    pub fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub(crate) const fn from_rc(inner: Rc<RefCell<GraphInner>>) -> Self {
        Self { inner }
    }

    /// 获取内部 GraphInner 的不可变引用
    pub fn inner(&self) -> std::cell::Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    /// 将 NodeId 包装成 Var
    pub fn wrap_node_id(&self, node_id: NodeId) -> Var {
        Var::new(node_id, Rc::clone(&self.inner))
    }

    // ==================== 创建变量 ====================

    /// 创建输入节点并设置数据（形状固定为数据的形状）
    pub fn input(&self, data: &Tensor) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let node_id = g.new_input_node(DynamicShape::fixed(data.shape()), None)?;
        g.set_node_value(node_id, Some(data))?;
        Ok(self.wrap_node_id(node_id))
    }

    /// 创建占位符：形状可含动态维度，值在每次前向传播前通过`Var::feed`设置
    pub fn placeholder(&self, shape: DynamicShape, name: &str) -> Result<Var, GraphError> {
        let node_id = self.inner.borrow_mut().new_input_node(shape, Some(name))?;
        Ok(self.wrap_node_id(node_id))
    }

    /// 创建可训练参数节点，按`init`初始化（使用图的随机数生成器）
    pub fn parameter(&self, shape: &[usize], init: Init, name: &str) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let node_id = g.new_parameter_node(shape, true, Some(name))?;
        let init_data = init.generate_with_rng(shape, g.rng_mut());
        g.set_node_value(node_id, Some(&init_data))?;
        Ok(self.wrap_node_id(node_id))
    }

    /// 创建不可训练（冻结）的参数节点，值直接取自`data`
    pub fn frozen_parameter(&self, data: &Tensor, name: &str) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let node_id = g.new_parameter_node(data.shape(), false, Some(name))?;
        g.set_node_value(node_id, Some(data))?;
        Ok(self.wrap_node_id(node_id))
    }

    /// 按名称查找节点
    pub fn get_var_by_name(&self, name: &str) -> Option<Var> {
        let node_id = self.inner.borrow().find_node_by_name(name)?;
        Some(self.wrap_node_id(node_id))
    }

    // ==================== 执行 ====================

    /// 前向传播
    pub fn forward(&self, output: &Var) -> Result<(), GraphError> {
        output.forward()
    }

    /// 反向传播
    pub fn backward(&self, loss: &Var) -> Result<f32, GraphError> {
        loss.backward()
    }

    // ==================== 训练控制 ====================

    /// 清零所有参数的梯度
    pub fn zero_grad(&self) {
        self.inner.borrow_mut().clear_grad();
    }

    /// 设置训练模式
    pub fn train(&self) {
        self.inner.borrow_mut().set_train_mode();
    }

    /// 设置评估模式
    pub fn eval(&self) {
        self.inner.borrow_mut().set_eval_mode();
    }

    /// 是否处于评估模式
    pub fn is_eval(&self) -> bool {
        !self.inner.borrow().is_train_mode()
    }

    /// 在评估模式中执行闭包，结束后恢复原模式
    pub fn no_grad_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        let was_train = !self.is_eval();
        self.eval();
        let result = f(self);
        if was_train {
            self.train();
        }
        result
    }

    /// 图中节点总数
    pub fn nodes_count(&self) -> usize {
        self.inner.borrow().nodes_count()
    }

    // ==================== 参数 I/O ====================

    /// 保存指定参数到文件
    pub fn save_params<P: AsRef<Path>>(&self, params: &[Var], path: P) -> Result<(), GraphError> {
        let ids = params.iter().map(Var::node_id).collect::<Vec<_>>();
        self.inner.borrow().save_params(&ids, path)
    }

    /// 从文件加载指定参数
    pub fn load_params<P: AsRef<Path>>(&self, params: &[Var], path: P) -> Result<(), GraphError> {
        let ids = params.iter().map(Var::node_id).collect::<Vec<_>>();
        self.inner.borrow_mut().load_params(&ids, path)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
