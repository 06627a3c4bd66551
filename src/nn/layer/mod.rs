mod conv2d;
mod conv_transpose2d;

pub use conv2d::Conv2d;
pub use conv_transpose2d::ConvTranspose2d;
