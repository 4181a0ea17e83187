// 该文件是 Baicao （百草） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 分类模型
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

use std::sync::Mutex;

use ort::{session::Session, value::Tensor};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  artifact::{ArtifactError, ModelArtifact},
  frame::ClassifierFrame,
  model::{Model, ModelBuilder},
};

const ONNX_NUM_INPUTS: usize = 1;

/// 模型期望的输入排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
  /// [1, 224, 224, 3]，Keras 导出的模型
  #[default]
  Nhwc,
  /// [1, 3, 224, 224]
  Nchw,
}

impl std::str::FromStr for TensorLayout {
  type Err = OnnxError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "nhwc" => Ok(TensorLayout::Nhwc),
      "nchw" => Ok(TensorLayout::Nchw),
      other => Err(OnnxError::ModelPathError(format!(
        "未知的输入排列: {}",
        other
      ))),
    }
  }
}

#[derive(Error, Debug)]
pub enum OnnxError {
  #[error("模型文件错误: {0}")]
  ArtifactError(#[from] ArtifactError),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("推理会话锁已失效")]
  Poisoned,
}

pub struct OnnxClassifier {
  session: Mutex<Session>,
  layout: TensorLayout,
  num_classes: Option<usize>,
}

pub struct OnnxClassifierBuilder {
  artifact: ModelArtifact,
  layout: TensorLayout,
}

impl FromUrlWithScheme for OnnxClassifierBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxClassifierBuilder {
  type Error = OnnxError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OnnxError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let layout = url
      .query_pairs()
      .find(|(k, _)| k == "layout")
      .map(|(_, v)| v.parse::<TensorLayout>())
      .transpose()?
      .unwrap_or_default();

    Ok(OnnxClassifierBuilder {
      artifact: ModelArtifact::new(crate::url_to_path(url)),
      layout,
    })
  }
}

impl OnnxClassifierBuilder {
  /// 本地文件缺失时的下载地址
  pub fn remote(mut self, remote: Option<Url>) -> Self {
    self.artifact = self.artifact.with_remote(remote);
    self
  }

  pub fn layout(mut self, layout: TensorLayout) -> Self {
    self.layout = layout;
    self
  }
}

impl ModelBuilder for OnnxClassifierBuilder {
  type Model = OnnxClassifier;
  type Error = OnnxError;

  fn build(self) -> Result<OnnxClassifier, OnnxError> {
    let path = self.artifact.ensure_local()?;
    info!("加载模型文件: {}", path.display());

    let session = Session::builder()?.commit_from_file(path)?;

    if session.inputs.len() != ONNX_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        ONNX_NUM_INPUTS,
        session.inputs.len()
      );
      return Err(OnnxError::ModelInvalid(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        ONNX_NUM_INPUTS,
        session.inputs.len()
      )));
    }

    let num_classes = session
      .outputs
      .first()
      .ok_or_else(|| OnnxError::ModelInvalid("模型没有输出".to_string()))?
      .output_type
      .tensor_shape()
      .and_then(|shape| shape.last().copied())
      .filter(|&dim| dim > 0)
      .map(|dim| dim as usize);

    debug!("模型输入: {}", session.inputs[0].name);
    debug!("模型输出维度: {:?}", num_classes);
    debug!("输入排列: {:?}", self.layout);

    Ok(OnnxClassifier {
      session: Mutex::new(session),
      layout: self.layout,
      num_classes,
    })
  }
}

impl Model for OnnxClassifier {
  type Input = ClassifierFrame;
  type Output = Box<[f32]>;
  type Error = OnnxError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let (height, width, channels) = (input.height(), input.width(), input.channels());
    let tensor = match self.layout {
      TensorLayout::Nhwc => {
        Tensor::from_array(([1usize, height, width, channels], input.as_nhwc().to_vec()))?
      }
      TensorLayout::Nchw => Tensor::from_array(([1usize, channels, height, width], input.to_nchw()))?,
    };

    let mut session = self.session.lock().map_err(|_| OnnxError::Poisoned)?;

    debug!("执行模型推理");
    let outputs = session.run(ort::inputs![tensor])?;
    let (_, probabilities) = outputs[0].try_extract_tensor::<f32>()?;
    debug!("模型输出长度: {}", probabilities.len());

    Ok(probabilities.to_vec().into_boxed_slice())
  }

  fn num_classes(&self) -> Option<usize> {
    self.num_classes
  }
}
