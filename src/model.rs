// 该文件是 Baicao （百草） 项目的一部分。
// src/model.rs - 模型
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

use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;

  /// 模型输出向量长度，后端无法得知时返回 None
  fn num_classes(&self) -> Option<usize> {
    None
  }
}

pub trait ModelBuilder {
  type Model;
  type Error: std::error::Error + Send + Sync + 'static;

  fn build(self) -> Result<Self::Model, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型不可用: {0}")]
  ModelUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
  pub fn unavailable<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    ModelError::ModelUnavailable(Box::new(err))
  }
}

mod handle;
pub use self::handle::ModelHandle;

#[cfg(feature = "model_onnx")]
mod onnx;
#[cfg(feature = "model_onnx")]
pub use self::onnx::{OnnxClassifier, OnnxClassifierBuilder, OnnxError, TensorLayout};
