//! 数据加载模块
//!
//! 提供KITTI道路数据集的样本配对、标签编码和批处理功能。
//!
//! # 主要组件
//!
//! - [`Batch`]: 一批图像及其 one-hot 标签（NCHW）
//! - [`BatchSource`]: 训练循环的批数据来源，每个 epoch 重新调用一次
//! - [`KittiRoadBatches`]: KITTI road 训练集的批数据来源
//! - [`check_kitti_dataset`]: 训练前的数据集完整性检查
//! - [`transforms`]: 图像缩放、标签编码等变换
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use road_fcn::data::{BatchSource, KittiRoadBatches};
//!
//! let mut source = KittiRoadBatches::open("./data/data_road/training", (160, 576))?.with_seed(42);
//! for batch in source.batches(8) {
//!     let batch = batch?;
//!     println!("{:?}", batch.images.shape());
//! }
//! ```

mod batch;
pub mod error;
mod kitti;
pub mod transforms;

#[cfg(test)]
mod tests;

pub use batch::{Batch, BatchSource};
pub use error::DataError;
pub use kitti::{KittiRoadBatches, KittiSample, KittiSummary, check_kitti_dataset, testing_images};
pub(crate) use kitti::open_rgb;
