/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : Module trait 定义
 */

use super::Var;

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（签名各异）
/// - `new()` **不是** trait 方法（参数各异）
/// - `parameters()` 返回 `Vec<Var>`（签名一致，放入 trait）
/// - 由于 Var 携带图引用，`forward()` 不需要 `&Graph` 参数
pub trait Module {
    /// 获取模块的所有参数。
    /// 用于：
    /// - 优化器需要知道要更新哪些参数
    /// - 序列化/保存模型参数
    fn parameters(&self) -> Vec<Var>;

    /// 获取参数（张量）个数
    fn num_params(&self) -> usize {
        self.parameters().len()
    }
}
