/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : GraphInner 节点构建方法（new_*_node）。
 *                 所有形状校验都在建图时完成，失败即返回错误，不会留下半建好的节点。
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::raw_node::{
    Add, ChannelBiasAdd, Conv2d, ConvTranspose2d, Dropout, FlattenPixels, Input, LeakyReLU,
    MaxPool2d, Parameter, SoftmaxCrossEntropy,
};
use crate::nn::nodes::{NodeHandle, NodeType, TraitNode};
use crate::nn::shape::DynamicShape;

impl GraphInner {
    /// 添加节点到列表
    fn add_node_to_list<T: Into<NodeType>>(
        &mut self,
        raw_node: T,
        name: Option<&str>,
        parents: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let raw_node = raw_node.into();
        let node_id = NodeId(self.next_id);
        let node_name = match name {
            Some(name) => {
                if self.find_node_by_name(name).is_some() {
                    return Err(GraphError::DuplicateNodeName(name.to_string()));
                }
                name.to_string()
            }
            None => format!("{}_{}", raw_node.type_name().to_lowercase(), node_id.0),
        };
        self.next_id += 1;

        self.backward_edges
            .entry(node_id)
            .or_default()
            .extend(parents);

        self.nodes
            .insert(node_id, NodeHandle::new(node_id, &node_name, raw_node));
        Ok(node_id)
    }

    fn parent_shapes(&self, parents: &[NodeId]) -> Result<Vec<DynamicShape>, GraphError> {
        parents
            .iter()
            .map(|&id| Ok(self.get_node(id)?.value_expected_shape().clone()))
            .collect()
    }

    /// 依据父节点的预期形状构造原始节点，再加入图中
    fn new_node_with_parents<T, F>(
        &mut self,
        parents: &[NodeId],
        name: Option<&str>,
        build: F,
    ) -> Result<NodeId, GraphError>
    where
        T: Into<NodeType>,
        F: FnOnce(&mut Self, &[&DynamicShape]) -> Result<T, GraphError>,
    {
        let shapes = self.parent_shapes(parents)?;
        let shape_refs = shapes.iter().collect::<Vec<_>>();
        let raw_node = build(self, &shape_refs)?;
        self.add_node_to_list(raw_node, name, parents)
    }

    /// 创建输入节点（占位符），其值须在前向传播前设置
    pub fn new_input_node(
        &mut self,
        shape: DynamicShape,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_node_to_list(Input::new(shape), name, &[])
    }

    /// 创建参数节点（值须随后设置）
    pub fn new_parameter_node(
        &mut self,
        shape: &[usize],
        trainable: bool,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_node_to_list(Parameter::new(shape, trainable), name, &[])
    }

    pub fn new_add_node(
        &mut self,
        parents: &[NodeId],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(parents, name, |_, shapes| Add::new(shapes))
    }

    pub fn new_channel_bias_add_node(
        &mut self,
        input: NodeId,
        bias: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[input, bias], name, |_, shapes| {
            ChannelBiasAdd::new(shapes)
        })
    }

    pub fn new_conv2d_node(
        &mut self,
        input: NodeId,
        kernel: NodeId,
        stride: (usize, usize),
        padding: (usize, usize),
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[input, kernel], name, |_, shapes| {
            Conv2d::new(shapes, stride, padding)
        })
    }

    pub fn new_conv_transpose2d_node(
        &mut self,
        input: NodeId,
        kernel: NodeId,
        stride: (usize, usize),
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[input, kernel], name, |_, shapes| {
            ConvTranspose2d::new(shapes, stride)
        })
    }

    pub fn new_dropout_node(
        &mut self,
        input: NodeId,
        keep_prob: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[input, keep_prob], name, |graph, shapes| {
            Dropout::new(shapes, graph.fork_rng())
        })
    }

    pub fn new_flatten_pixels_node(
        &mut self,
        input: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[input], name, |_, shapes| FlattenPixels::new(shapes))
    }

    pub fn new_leaky_relu_node(
        &mut self,
        input: NodeId,
        alpha: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[input], name, |_, shapes| LeakyReLU::new(shapes, alpha))
    }

    pub fn new_max_pool2d_node(
        &mut self,
        input: NodeId,
        kernel: (usize, usize),
        stride: (usize, usize),
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[input], name, |_, shapes| {
            MaxPool2d::new(shapes, kernel, stride)
        })
    }

    pub fn new_softmax_cross_entropy_node(
        &mut self,
        logits: NodeId,
        labels: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.new_node_with_parents(&[logits, labels], name, |_, shapes| {
            SoftmaxCrossEntropy::new(shapes)
        })
    }
}
