// ============================================================
// Layer 5 - Ceil-mode Max Pooling
// ============================================================
// SqueezeNet pools with a 3×3 window, stride 2 and ceil-mode
// output sizing: a trailing partial window still produces an
// output as long as it starts inside the input. burn's MaxPool2d
// floors, so the input is padded on the bottom/right with -inf
// until the last window fits, then pooled with no padding.

use burn::{
    nn::{
        pool::{MaxPool2d, MaxPool2dConfig},
        PaddingConfig2d,
    },
    prelude::*,
};

#[derive(Config, Debug)]
pub struct CeilMaxPool2dConfig {
    #[config(default = 3)]
    pub kernel: usize,
    #[config(default = 2)]
    pub stride: usize,
}

impl CeilMaxPool2dConfig {
    pub fn init(&self) -> CeilMaxPool2d {
        let pool = MaxPool2dConfig::new([self.kernel, self.kernel])
            .with_strides([self.stride, self.stride])
            .with_padding(PaddingConfig2d::Valid)
            .init();
        CeilMaxPool2d { pool, kernel: self.kernel, stride: self.stride }
    }
}

#[derive(Module, Clone, Debug)]
pub struct CeilMaxPool2d {
    pool:   MaxPool2d,
    kernel: usize,
    stride: usize,
}

impl CeilMaxPool2d {
    /// Pooled length of one spatial axis, or None if `len` is smaller
    /// than the window.
    pub fn output_len(&self, len: usize) -> Option<usize> {
        ceil_pool_len(len, self.kernel, self.stride)
    }

    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, h, w] = x.dims();
        let pad_h = self.trailing_pad(h);
        let pad_w = self.trailing_pad(w);
        self.pool.forward(pad_bottom_right(x, pad_h, pad_w))
    }

    fn trailing_pad(&self, len: usize) -> usize {
        match self.output_len(len) {
            Some(out) => ((out - 1) * self.stride + self.kernel).saturating_sub(len),
            None => 0,
        }
    }
}

/// ceil((len - kernel) / stride) + 1, dropping a final window that would
/// start past the end of the input.
pub fn ceil_pool_len(len: usize, kernel: usize, stride: usize) -> Option<usize> {
    if len < kernel || stride == 0 {
        return None;
    }
    let mut out = (len - kernel).div_ceil(stride) + 1;
    if (out - 1) * stride >= len {
        out -= 1;
    }
    Some(out)
}

fn pad_bottom_right<B: Backend>(x: Tensor<B, 4>, pad_h: usize, pad_w: usize) -> Tensor<B, 4> {
    let device = x.device();
    let [n, c, h, w] = x.dims();
    let x = if pad_h > 0 {
        let fill = Tensor::<B, 4>::full([n, c, pad_h, w], f32::NEG_INFINITY, &device);
        Tensor::cat(vec![x, fill], 2)
    } else {
        x
    };
    if pad_w > 0 {
        let fill = Tensor::<B, 4>::full([n, c, h + pad_h, pad_w], f32::NEG_INFINITY, &device);
        Tensor::cat(vec![x, fill], 3)
    } else {
        x
    }
}
