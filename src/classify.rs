// 该文件是 Baicao （百草） 项目的一部分。
// src/classify.rs - 分类判定流程
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

use image::DynamicImage;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  catalog::{ClassCatalog, UsesTable},
  frame::ClassifierFrame,
  model::{Model, ModelHandle},
};

/// 缺省置信度阈值
pub const DEFAULT_THRESHOLD: f32 = 0.75;

#[derive(Error, Debug)]
pub enum ClassifyError {
  #[error("无法解码图像: {0}")]
  InvalidImage(#[from] image::ImageError),
  #[error("模型推理失败: {0}")]
  Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("模型输出长度 {actual} 与类别数量 {expected} 不一致")]
  OutputMismatch { expected: usize, actual: usize },
  #[error("模型输出为空")]
  EmptyOutput,
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("置信度阈值必须位于 [0, 1]: {0}")]
  InvalidThreshold(f32),
  #[error("模型输出维度 {model} 与类别数量 {catalog} 不一致")]
  CatalogMismatch { catalog: usize, model: usize },
}

/// 置信度阈值，比较时包含边界
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Threshold(f32);

impl Threshold {
  pub fn new(value: f32) -> Result<Self, ConfigError> {
    if !(0.0..=1.0).contains(&value) {
      return Err(ConfigError::InvalidThreshold(value));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> f32 {
    self.0
  }

  pub fn admits(&self, confidence: f32) -> bool {
    confidence >= self.0
  }
}

impl Default for Threshold {
  fn default() -> Self {
    Self(DEFAULT_THRESHOLD)
  }
}

impl TryFrom<f32> for Threshold {
  type Error = ConfigError;

  fn try_from(value: f32) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
  pub class_index: usize,
  pub class_name: String,
  pub confidence: f32,
  pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
  Accepted {
    #[serde(flatten)]
    prediction: Prediction,
    uses: Vec<String>,
  },
  Rejected {
    #[serde(flatten)]
    prediction: Prediction,
  },
}

impl Decision {
  pub fn prediction(&self) -> &Prediction {
    match self {
      Decision::Accepted { prediction, .. } | Decision::Rejected { prediction } => prediction,
    }
  }

  pub fn is_accepted(&self) -> bool {
    matches!(self, Decision::Accepted { .. })
  }

  /// 被拒绝时返回 None
  pub fn uses(&self) -> Option<&[String]> {
    match self {
      Decision::Accepted { uses, .. } => Some(uses),
      Decision::Rejected { .. } => None,
    }
  }
}

/// 最大值及其位置；并列时取最小下标，NaN 不参与比较
pub fn arg_max(values: &[f32]) -> Option<(usize, f32)> {
  values
    .iter()
    .copied()
    .enumerate()
    .filter(|(_, value)| !value.is_nan())
    .fold(None, |best, (index, value)| match best {
      Some((_, max)) if value <= max => best,
      _ => Some((index, value)),
    })
}

/// 由模型输出得出判定
pub fn decide(
  output: &[f32],
  catalog: &ClassCatalog,
  uses: &UsesTable,
  threshold: Threshold,
) -> Result<Decision, ClassifyError> {
  let mismatch = ClassifyError::OutputMismatch {
    expected: catalog.len(),
    actual: output.len(),
  };
  if output.len() != catalog.len() {
    return Err(mismatch);
  }

  let (class_index, confidence) = arg_max(output).ok_or(ClassifyError::EmptyOutput)?;
  let class_name = catalog.get(class_index).ok_or(mismatch)?.to_string();
  let accepted = threshold.admits(confidence);
  let prediction = Prediction {
    class_index,
    class_name,
    confidence,
    accepted,
  };

  if !accepted {
    return Ok(Decision::Rejected { prediction });
  }

  let uses = uses.uses_for(&prediction.class_name).to_vec();
  Ok(Decision::Accepted { prediction, uses })
}

/// 解码上传数据，预处理，推理一次并判定
pub fn classify<M>(
  bytes: &[u8],
  model: &M,
  catalog: &ClassCatalog,
  uses: &UsesTable,
  threshold: Threshold,
) -> Result<Decision, ClassifyError>
where
  M: Model<Input = ClassifierFrame>,
  M::Output: AsRef<[f32]>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  let image = image::load_from_memory(bytes)?;
  classify_image(&image, model, catalog, uses, threshold)
}

pub fn classify_image<M>(
  image: &DynamicImage,
  model: &M,
  catalog: &ClassCatalog,
  uses: &UsesTable,
  threshold: Threshold,
) -> Result<Decision, ClassifyError>
where
  M: Model<Input = ClassifierFrame>,
  M::Output: AsRef<[f32]>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  debug!("输入图像尺寸: {}x{}", image.width(), image.height());
  let frame = ClassifierFrame::from_image(image);

  let now = std::time::Instant::now();
  let output = model
    .infer(&frame)
    .map_err(|e| ClassifyError::Inference(Box::new(e)))?;
  debug!("推理完成，耗时: {:.2?}", now.elapsed());

  decide(output.as_ref(), catalog, uses, threshold)
}

/// 持有模型句柄与数据表的分类器，在各请求间只读共享
pub struct Classifier<M> {
  model: ModelHandle<M>,
  catalog: ClassCatalog,
  uses: UsesTable,
  threshold: Threshold,
}

impl<M> Classifier<M>
where
  M: Model<Input = ClassifierFrame>,
  M::Output: AsRef<[f32]>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(
    model: ModelHandle<M>,
    catalog: ClassCatalog,
    uses: UsesTable,
    threshold: Threshold,
  ) -> Result<Self, ConfigError> {
    if let Some(classes) = model.num_classes()
      && classes != catalog.len()
    {
      return Err(ConfigError::CatalogMismatch {
        catalog: catalog.len(),
        model: classes,
      });
    }

    info!(
      "分类器就绪: {} 个类别, 置信度阈值 {}",
      catalog.len(),
      threshold.value()
    );

    Ok(Self {
      model,
      catalog,
      uses,
      threshold,
    })
  }

  pub fn classify(&self, bytes: &[u8]) -> Result<Decision, ClassifyError> {
    classify(bytes, &self.model, &self.catalog, &self.uses, self.threshold)
  }

  pub fn classify_image(&self, image: &DynamicImage) -> Result<Decision, ClassifyError> {
    classify_image(image, &self.model, &self.catalog, &self.uses, self.threshold)
  }

  pub fn model(&self) -> &ModelHandle<M> {
    &self.model
  }

  pub fn catalog(&self) -> &ClassCatalog {
    &self.catalog
  }

  pub fn uses(&self) -> &UsesTable {
    &self.uses
  }

  pub fn threshold(&self) -> Threshold {
    self.threshold
  }
}
