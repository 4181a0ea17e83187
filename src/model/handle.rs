// 该文件是 Baicao （百草） 项目的一部分。
// src/model/handle.rs - 共享模型句柄
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

use std::{ops::Deref, sync::Arc};

use tracing::{error, info};

use crate::model::{Model, ModelBuilder, ModelError};

/// 进程启动时加载一次的只读模型，克隆后在各请求间共享
#[derive(Debug)]
pub struct ModelHandle<M> {
  inner: Arc<M>,
}

impl<M> Clone for ModelHandle<M> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<M> ModelHandle<M> {
  pub fn new(model: M) -> Self {
    Self {
      inner: Arc::new(model),
    }
  }

  pub fn load<B: ModelBuilder<Model = M>>(builder: B) -> Result<Self, ModelError> {
    info!("正在加载模型...");
    let now = std::time::Instant::now();
    let model = builder.build().map_err(|e| {
      error!("模型加载失败: {}", e);
      ModelError::unavailable(e)
    })?;
    info!("模型加载完成，耗时: {:.2?}", now.elapsed());
    Ok(Self::new(model))
  }
}

impl<M> Deref for ModelHandle<M> {
  type Target = M;

  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

impl<M: Model> Model for ModelHandle<M> {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.inner.infer(input)
  }

  fn num_classes(&self) -> Option<usize> {
    self.inner.num_classes()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug)]
  struct Echo;

  impl Model for Echo {
    type Input = f32;
    type Output = f32;
    type Error = std::convert::Infallible;

    fn infer(&self, input: &f32) -> Result<f32, Self::Error> {
      Ok(*input)
    }
  }

  struct EchoBuilder(bool);

  #[derive(thiserror::Error, Debug)]
  #[error("权重文件损坏")]
  struct Corrupt;

  impl ModelBuilder for EchoBuilder {
    type Model = Echo;
    type Error = Corrupt;

    fn build(self) -> Result<Echo, Corrupt> {
      if self.0 { Ok(Echo) } else { Err(Corrupt) }
    }
  }

  #[test]
  fn clones_share_one_model() {
    let handle = ModelHandle::load(EchoBuilder(true)).unwrap();
    let other = handle.clone();
    assert!(Arc::ptr_eq(&handle.inner, &other.inner));
    assert_eq!(other.infer(&0.5).unwrap(), 0.5);
  }

  #[test]
  fn failed_build_is_unavailable() {
    let err = ModelHandle::load(EchoBuilder(false)).unwrap_err();
    assert!(matches!(err, ModelError::ModelUnavailable(_)));
    assert!(err.to_string().contains("权重文件损坏"));
  }
}
