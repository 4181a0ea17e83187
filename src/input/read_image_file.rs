// 该文件是 Baicao （百草） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::Path;

use crate::{FromUrl, FromUrlWithScheme, input::Upload};

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
}

/// 读取单个图像文件作为一次上传；解码留给分类流程
pub struct ImageFileInput {
  upload: Option<Upload>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    Self::open(crate::url_to_path(url))
  }
}

impl ImageFileInput {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!("读取图像文件: {} ({} 字节)", path.display(), bytes.len());

    let name = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());

    Ok(ImageFileInput {
      upload: Some(Upload::new(name, bytes)),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    self.upload.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn yields_one_upload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("neem.jpg");
    std::fs::write(&path, b"jpeg bytes").unwrap();

    let mut input = ImageFileInput::open(&path).unwrap();
    assert_eq!(input.next(), Some(Upload::new("neem.jpg", b"jpeg bytes".to_vec())));
    assert_eq!(input.next(), None);
  }

  #[test]
  fn missing_file_fails_at_open() {
    let dir = tempdir().unwrap();
    assert!(matches!(
      ImageFileInput::open(dir.path().join("absent.jpg")),
      Err(ImageFileInputError::IoError(_))
    ));
  }

  #[test]
  fn scheme_must_match() {
    let url = Url::parse("folder:///tmp/uploads").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }
}
