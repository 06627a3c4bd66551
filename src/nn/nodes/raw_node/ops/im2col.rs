/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : im2col / col2im：把卷积的滑窗展开为矩阵，使卷积与转置卷积都能化为一次矩阵乘法。
 *                 卷积：      输出 = W[C_out, C_in·kH·kW] · im2col(输入)
 *                 转置卷积：  输出 = col2im(Wᵀ · 输入)，即卷积对输入求梯度的过程
 */

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

/// 一次卷积的几何参数。"图像侧"是被滑窗覆盖的张量（卷积的输入、转置卷积的输出），
/// "列侧"是滑窗位置构成的网格（卷积的输出、转置卷积的输入）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConvGeometry {
    pub(crate) channels: usize,
    pub(crate) height: usize,
    pub(crate) width: usize,
    pub(crate) kernel: (usize, usize),
    pub(crate) stride: (usize, usize),
    /// 上、左两侧的填充（转置卷积中即为前端裁剪量）
    pub(crate) padding: (usize, usize),
    pub(crate) out_height: usize,
    pub(crate) out_width: usize,
}

impl ConvGeometry {
    pub(crate) const fn col_rows(&self) -> usize {
        self.channels * self.kernel.0 * self.kernel.1
    }

    pub(crate) const fn col_cols(&self) -> usize {
        self.out_height * self.out_width
    }

    /// 滑窗位置`out`上第`k`个卷积核元素对应的图像坐标，落在填充区时返回None
    const fn source(out: usize, k: usize, stride: usize, padding: usize, size: usize) -> Option<usize> {
        let pos = out * stride + k;
        if pos < padding || pos - padding >= size {
            None
        } else {
            Some(pos - padding)
        }
    }

    /// 按行（通道、核行、核列）与列（滑窗位置）遍历所有落在图像内的对应关系
    fn for_each_pair(&self, mut f: impl FnMut(usize, usize, [usize; 3])) {
        let (kh, kw) = self.kernel;
        for c in 0..self.channels {
            for i in 0..kh {
                for j in 0..kw {
                    let row = (c * kh + i) * kw + j;
                    for oy in 0..self.out_height {
                        let Some(y) = Self::source(oy, i, self.stride.0, self.padding.0, self.height)
                        else {
                            continue;
                        };
                        for ox in 0..self.out_width {
                            if let Some(x) =
                                Self::source(ox, j, self.stride.1, self.padding.1, self.width)
                            {
                                f(row, oy * self.out_width + ox, [c, y, x]);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// 图像[C, H, W] -> 列矩阵[C·kH·kW, outH·outW]
pub(crate) fn im2col(image: ArrayView3<'_, f32>, geometry: &ConvGeometry) -> Array2<f32> {
    let mut cols = Array2::zeros((geometry.col_rows(), geometry.col_cols()));
    geometry.for_each_pair(|row, col, pos| cols[[row, col]] = image[pos]);
    cols
}

/// 列矩阵[C·kH·kW, outH·outW] -> 图像[C, H, W]，重叠位置累加
pub(crate) fn col2im(cols: ArrayView2<'_, f32>, geometry: &ConvGeometry) -> Array3<f32> {
    let mut image = Array3::zeros((geometry.channels, geometry.height, geometry.width));
    geometry.for_each_pair(|row, col, pos| image[pos] += cols[[row, col]]);
    image
}
