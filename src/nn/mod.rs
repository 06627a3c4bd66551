/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : 神经网络模块：显式计算图 + 自动微分（VJP），以及基于其上的层与优化器
 */

mod graph;
pub mod layer;
mod module;
mod nodes;
pub mod optimizer;
mod shape;
mod var;

pub use graph::{Graph, GraphError, GraphInner, ParamsFile};
pub use module::Module;
pub use nodes::NodeId;
pub use shape::{Dim, DynamicShape};
pub use var::{Init, Var};

#[cfg(test)]
mod tests;
