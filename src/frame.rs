// 该文件是 Baicao （百草） 项目的一部分。
// src/frame.rs - 归一化 NHWC 帧定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Baicao contributors

use image::{DynamicImage, RgbImage, imageops::FilterType};
use thiserror::Error;

const RGB_CHANNELS: usize = 3;

/// 分类器输入边长
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

/// 分类器使用的输入帧：1x224x224x3，取值范围 [0, 1]
pub type ClassifierFrame = RgbNhwcFrame<CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE>;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 单张图像组成的批次，按 NHWC 排列的归一化浮点数据
#[derive(Debug, Clone, PartialEq)]
pub struct RgbNhwcFrame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> RgbNhwcFrame<W, H> {
  const LEN: usize = RGB_CHANNELS * W as usize * H as usize;

  /// 将任意图像转换为 RGB，拉伸到 W x H（不保持宽高比），再除以 255
  pub fn from_image(image: &DynamicImage) -> Self {
    Self::from_rgb(&image.to_rgb8())
  }

  pub fn from_rgb(image: &RgbImage) -> Self {
    if image.dimensions() == (W, H) {
      return Self::normalize(image);
    }
    let resized = image::imageops::resize(image, W, H, FilterType::Triangle);
    Self::normalize(&resized)
  }

  fn normalize(image: &RgbImage) -> Self {
    let data = image
      .as_raw()
      .iter()
      .map(|&value| value as f32 / 255.0)
      .collect::<Vec<_>>();
    Self {
      data: data.into_boxed_slice(),
    }
  }

  /// 张量形状 [N, H, W, C]
  pub fn shape(&self) -> [usize; 4] {
    [1, H as usize, W as usize, RGB_CHANNELS]
  }

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn as_nhwc(&self) -> &[f32] {
    &self.data
  }

  /// 转置为 NCHW 排列，供通道优先的模型使用
  pub fn to_nchw(&self) -> Vec<f32> {
    let (height, width) = (H as usize, W as usize);
    let mut nchw = vec![0.0f32; Self::LEN];
    for h in 0..height {
      for w in 0..width {
        for c in 0..RGB_CHANNELS {
          let src = (h * width + w) * RGB_CHANNELS + c;
          let dst = c * height * width + h * width + w;
          nchw[dst] = self.data[src];
        }
      }
    }
    nchw
  }
}

impl<const W: u32, const H: u32> TryFrom<Vec<f32>> for RgbNhwcFrame<W, H> {
  type Error = FrameError;

  fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
    if data.len() != Self::LEN {
      return Err(FrameError::LengthMismatch {
        expected: Self::LEN,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}
