// 该文件是 Baicao （百草） 项目的一部分。
// src/output/jsonl_output.rs - JSON Lines 判定记录
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

use std::{
  fs::{File, OpenOptions},
  io::Write,
  path::{Path, PathBuf},
  sync::Mutex,
};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  classify::Decision,
  input::Upload,
  output::{Outcome, Render, message::describe_error},
};

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("记录文件锁已失效")]
  Poisoned,
}

#[derive(Serialize)]
struct Record<'a> {
  timestamp: String,
  upload: &'a str,
  #[serde(flatten)]
  decision: Option<&'a Decision>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

/// 每次判定追加一行 JSON 记录
pub struct JsonLinesOutput {
  path: PathBuf,
  file: Mutex<File>,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonLinesOutputError::SchemeMismatch);
    }

    Self::open(crate::url_to_path(uri))
  }
}

impl JsonLinesOutput {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JsonLinesOutputError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    info!("判定记录写入: {}", path.display());

    Ok(JsonLinesOutput {
      path: path.to_path_buf(),
      file: Mutex::new(file),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Render<Upload, Outcome> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, upload: &Upload, outcome: &Outcome) -> Result<(), Self::Error> {
    let record = Record {
      timestamp: Utc::now().to_rfc3339(),
      upload: &upload.name,
      decision: outcome.as_ref().ok(),
      error: outcome.as_ref().err().map(describe_error),
    };

    let mut line = serde_json::to_string(&record)?;
    line.push('\n');

    let mut file = self
      .file
      .lock()
      .map_err(|_| JsonLinesOutputError::Poisoned)?;
    file.write_all(line.as_bytes())?;
    file.flush()?;
    debug!("已记录判定: {}", upload.name);

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::classify::{ClassifyError, Prediction};

  #[test]
  fn appends_one_record_per_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records").join("decisions.jsonl");
    let output = JsonLinesOutput::open(&path).unwrap();

    let accepted: Outcome = Ok(Decision::Accepted {
      prediction: Prediction {
        class_index: 1,
        class_name: "Neem".to_string(),
        confidence: 0.875,
        accepted: true,
      },
      uses: vec!["Skin care".to_string()],
    });
    let failed: Outcome = Err(ClassifyError::EmptyOutput);

    output
      .render_result(&Upload::new("neem.jpg", Vec::new()), &accepted)
      .unwrap();
    output
      .render_result(&Upload::new("broken.jpg", Vec::new()), &failed)
      .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines = content
      .lines()
      .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
      .collect::<Vec<_>>();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["upload"], "neem.jpg");
    assert_eq!(lines[0]["outcome"], "accepted");
    assert_eq!(lines[0]["class_name"], "Neem");
    assert_eq!(lines[0]["confidence"], 0.875);
    assert_eq!(lines[0]["uses"][0], "Skin care");
    assert!(lines[0].get("error").is_none());
    assert_eq!(lines[1]["upload"], "broken.jpg");
    assert!(lines[1].get("outcome").is_none());
    assert_eq!(lines[1]["error"], "the model returned no usable scores");
  }

  #[test]
  fn url_path_with_space_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("判定 记录").join("decisions.jsonl");
    let url = url::Url::parse(&format!("jsonl://{}", path.display())).unwrap();

    let output = JsonLinesOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), path.as_path());
    assert!(path.is_file());
  }
}
