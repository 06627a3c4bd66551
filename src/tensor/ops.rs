/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @Description  : 张量的四则运算（逐元素）及少量数学函数。
 *                 1. 张量与纯数之间：结果形状与该张量相同；
 *                 2. 两个张量之间：形状必须严格一致（不做广播），否则panic。
 */

use super::Tensor;
use crate::errors::{Operator, TensorError};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

fn assert_same_shape(a: &Tensor, b: &Tensor, operator: Operator) {
    assert!(
        a.is_same_shape(b),
        "{}",
        TensorError::OperatorError {
            operator,
            tensor1_shape: a.shape().to_vec(),
            tensor2_shape: b.shape().to_vec(),
        }
    );
}

/// 为（不）带引用的张量实现与另一个张量、与纯数的二元运算
macro_rules! impl_binary_op {
    ($trait_:ident, $method:ident, $operator:expr, $op:tt) => {
        impl $trait_<&Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                assert_same_shape(self, other, $operator);
                Tensor::from_array(&self.data $op &other.data)
            }
        }
        impl $trait_<Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                self $op &other
            }
        }
        impl $trait_<&Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                &self $op other
            }
        }
        impl $trait_ for Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                &self $op &other
            }
        }
        impl $trait_<f32> for &Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                Tensor::from_array(&self.data $op scalar)
            }
        }
        impl $trait_<f32> for Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                &self $op scalar
            }
        }
    };
}

impl_binary_op!(Add, add, Operator::Add, +);
impl_binary_op!(Sub, sub, Operator::Sub, -);
impl_binary_op!(Mul, mul, Operator::Mul, *);
impl_binary_op!(Div, div, Operator::Div, /);

impl AddAssign<&Self> for Tensor {
    fn add_assign(&mut self, other: &Self) {
        assert_same_shape(self, other, Operator::AddAssign);
        self.data += &other.data;
    }
}

impl SubAssign<&Self> for Tensor {
    fn sub_assign(&mut self, other: &Self) {
        assert_same_shape(self, other, Operator::SubAssign);
        self.data -= &other.data;
    }
}

impl MulAssign<f32> for Tensor {
    fn mul_assign(&mut self, scalar: f32) {
        self.data *= scalar;
    }
}

impl Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor::from_array(-&self.data)
    }
}

impl Tensor {
    /// 对每个元素应用`f`，返回新张量
    pub fn map(&self, f: impl FnMut(f32) -> f32) -> Self {
        Self::from_array(self.data.mapv(f))
    }

    pub fn sqrt(&self) -> Self {
        self.map(f32::sqrt)
    }

    pub fn exp(&self) -> Self {
        self.map(f32::exp)
    }

    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 空张量的均值按0处理
    pub fn mean(&self) -> f32 {
        if self.size() == 0 {
            0.0
        } else {
            self.sum() / self.size() as f32
        }
    }

    /// 所有元素绝对值的最大值
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0_f32, |acc, x| acc.max(x.abs()))
    }
}
