/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:00:00
 * @Description  : 优化器模块，实现梯度优化算法
 */

mod adam;
mod base;

pub use adam::Adam;
pub use base::Optimizer;
