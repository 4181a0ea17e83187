// 该文件是 Baicao （百草） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use url::Url;

use crate::{
  catalog::{CatalogError, Herbarium},
  classify::{ConfigError, DEFAULT_THRESHOLD, Threshold},
};

/// Baicao 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型路径，例如 onnx:///models/herbal.onnx?layout=nhwc
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 本地模型文件缺失时的下载地址
  #[arg(long, value_name = "URL")]
  pub model_remote: Option<Url>,

  /// 类别目录与用途表（JSON）
  #[arg(long, default_value = "assets/herbarium.json", value_name = "FILE")]
  pub herbarium: PathBuf,

  /// 输入来源
  /// 支持格式:
  /// - 图片: image:///path/leaf.jpg
  /// - 目录: folder:///path/uploads
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出方式
  /// 支持格式:
  /// - 控制台: console:
  /// - 记录文件: jsonl:///path/decisions.jsonl
  #[arg(long, default_value = "console:", value_name = "OUTPUT")]
  pub output: Url,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_name = "THRESHOLD")]
  pub threshold: f32,

  /// 最大处理上传数量（仅对目录有效）
  #[arg(long, value_name = "COUNT")]
  pub limit: Option<usize>,
}

impl Args {
  pub fn threshold(&self) -> Result<Threshold, ConfigError> {
    Threshold::new(self.threshold)
  }

  pub fn herbarium(&self) -> Result<Herbarium, CatalogError> {
    Herbarium::load(&self.herbarium)
  }

  pub fn log_summary(&self) {
    info!("模型路径: {}", self.model);
    if let Some(remote) = &self.model_remote {
      info!("模型下载地址: {}", remote);
    }
    info!("数据文件: {}", self.herbarium.display());
    info!("输入来源: {}", self.input);
    info!("输出方式: {}", self.output);
    info!("置信度阈值: {}", self.threshold);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let args = Args::try_parse_from([
      "baicao",
      "--model",
      "onnx:///models/herbal.onnx",
      "--input",
      "image:///tmp/leaf.jpg",
    ])
    .unwrap();

    assert_eq!(args.threshold, DEFAULT_THRESHOLD);
    assert_eq!(args.output.scheme(), "console");
    assert_eq!(args.herbarium, PathBuf::from("assets/herbarium.json"));
    assert!(args.model_remote.is_none());
    assert!(args.limit.is_none());
    assert_eq!(args.model.path(), "/models/herbal.onnx");
  }

  #[test]
  fn threshold_is_validated() {
    let args = Args::try_parse_from([
      "baicao",
      "--model",
      "onnx:///models/herbal.onnx",
      "--input",
      "folder:///tmp/uploads",
      "--threshold",
      "0.7",
      "--limit",
      "5",
    ])
    .unwrap();
    assert_eq!(args.threshold().unwrap().value(), 0.7);
    assert_eq!(args.limit, Some(5));

    let args = Args::try_parse_from([
      "baicao",
      "--model",
      "onnx:///models/herbal.onnx",
      "--input",
      "folder:///tmp/uploads",
      "--threshold",
      "1.5",
    ])
    .unwrap();
    assert!(matches!(
      args.threshold(),
      Err(ConfigError::InvalidThreshold(_))
    ));
  }
}
