mod add;
mod channel_bias_add;
mod conv2d;
mod conv_transpose2d;
mod dropout;
mod flatten_pixels;
mod im2col;
mod leaky_relu;
mod max_pool2d;

pub(crate) use add::Add;
pub(crate) use channel_bias_add::ChannelBiasAdd;
pub(crate) use conv2d::Conv2d;
pub(crate) use conv_transpose2d::ConvTranspose2d;
pub(crate) use dropout::Dropout;
pub(crate) use flatten_pixels::FlattenPixels;
pub(crate) use leaky_relu::LeakyReLU;
pub(crate) use max_pool2d::MaxPool2d;
