/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 会话：一次训练/推理运行所用计算图的唯一所有者。
 *                 骨干网络、解码器、目标函数都在同一个会话的图上建立；会话被drop时图中所有张量随之释放。
 */

use crate::nn::{Graph, GraphInner};

pub struct Session {
    graph: Graph,
}

impl Session {
    pub fn new() -> Self {
        Self::with_seed(None)
    }

    /// 指定种子时，参数初始化与dropout都可复现
    pub fn with_seed(seed: Option<u64>) -> Self {
        let mut inner = GraphInner::with_name("road_fcn");
        if let Some(seed) = seed {
            inner.set_seed(seed);
        }
        Self {
            graph: Graph::from_inner(inner),
        }
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!("释放会话，图中共{}个节点", self.graph.nodes_count());
    }
}
