// 该文件是 Baicao （百草） 项目的一部分。
// src/artifact.rs - 模型文件的本地缓存与远程获取
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Error, Debug)]
pub enum ArtifactError {
  #[error("模型文件不存在且未配置远程地址: {0}")]
  Missing(PathBuf),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[cfg(feature = "remote_fetch")]
  #[error("下载模型文件失败: {0}")]
  FetchError(#[from] reqwest::Error),
  #[cfg(not(feature = "remote_fetch"))]
  #[error("未启用远程获取，无法下载: {0}")]
  FetchDisabled(Url),
}

/// 本地模型文件；缺失时从远程地址下载一次
#[derive(Debug, Clone)]
pub struct ModelArtifact {
  path: PathBuf,
  remote: Option<Url>,
}

impl ModelArtifact {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      remote: None,
    }
  }

  pub fn with_remote(mut self, remote: Option<Url>) -> Self {
    self.remote = remote;
    self
  }

  /// 确保模型文件存在于本地，已存在时不做任何事
  pub fn ensure_local(&self) -> Result<&Path, ArtifactError> {
    if self.path.is_file() {
      debug!("模型文件已存在: {}", self.path.display());
      return Ok(&self.path);
    }

    let remote = self
      .remote
      .as_ref()
      .ok_or_else(|| ArtifactError::Missing(self.path.clone()))?;

    info!("首次使用，下载模型文件: {} -> {}", remote, self.path.display());
    download(remote, &self.path)?;
    Ok(&self.path)
  }
}

#[cfg_attr(not(feature = "remote_fetch"), allow(dead_code))]
fn partial_path(dest: &Path) -> PathBuf {
  let mut name = dest.file_name().unwrap_or_default().to_os_string();
  name.push(".part");
  dest.with_file_name(name)
}

#[cfg(feature = "remote_fetch")]
fn download(remote: &Url, dest: &Path) -> Result<(), ArtifactError> {
  if let Some(parent) = dest.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }

  let partial = partial_path(dest);
  let result = fetch_into(remote, &partial);
  match result {
    Ok(size) => {
      std::fs::rename(&partial, dest)?;
      info!(
        "模型文件下载完成: {:.2} MB",
        size as f64 / (1024.0 * 1024.0)
      );
      Ok(())
    }
    Err(e) => {
      let _ = std::fs::remove_file(&partial);
      Err(e)
    }
  }
}

#[cfg(feature = "remote_fetch")]
fn fetch_into(remote: &Url, partial: &Path) -> Result<u64, ArtifactError> {
  let mut response = reqwest::blocking::get(remote.as_str())?.error_for_status()?;
  let mut file = std::fs::File::create(partial)?;
  let size = response.copy_to(&mut file)?;
  file.sync_all()?;
  Ok(size)
}

#[cfg(not(feature = "remote_fetch"))]
fn download(remote: &Url, _dest: &Path) -> Result<(), ArtifactError> {
  Err(ArtifactError::FetchDisabled(remote.clone()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn existing_file_skips_fetch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("herbal.onnx");
    std::fs::write(&path, b"weights").unwrap();

    // 不可达地址，若发起请求必然失败
    let remote = Url::parse("http://127.0.0.1:9/herbal.onnx").unwrap();
    let artifact = ModelArtifact::new(&path).with_remote(Some(remote));

    assert_eq!(artifact.ensure_local().unwrap(), path.as_path());
    assert_eq!(std::fs::read(&path).unwrap(), b"weights");
  }

  #[test]
  fn missing_file_without_remote() {
    let dir = tempdir().unwrap();
    let artifact = ModelArtifact::new(dir.path().join("absent.onnx"));
    assert!(matches!(
      artifact.ensure_local(),
      Err(ArtifactError::Missing(_))
    ));
  }

  #[test]
  fn partial_path_is_a_sibling() {
    assert_eq!(
      partial_path(Path::new("/models/herbal.onnx")),
      PathBuf::from("/models/herbal.onnx.part")
    );
  }

  #[cfg(feature = "remote_fetch")]
  mod fetch {
    use super::*;
    use std::{
      io::{Read, Write},
      net::TcpListener,
      thread,
    };

    /// 只响应一次请求的 HTTP 服务
    fn serve_once(status: &'static str, body: &'static [u8]) -> Url {
      let listener = TcpListener::bind("127.0.0.1:0").unwrap();
      let addr = listener.local_addr().unwrap();
      thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
          let mut request = [0u8; 1024];
          let _ = stream.read(&mut request);
          let header = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
          );
          let _ = stream.write_all(header.as_bytes());
          let _ = stream.write_all(body);
        }
      });
      Url::parse(&format!("http://{}/herbal.onnx", addr)).unwrap()
    }

    #[test]
    fn downloads_when_missing() {
      let dir = tempdir().unwrap();
      let path = dir.path().join("models").join("herbal.onnx");
      let artifact = ModelArtifact::new(&path).with_remote(Some(serve_once("200 OK", b"weights")));

      artifact.ensure_local().unwrap();

      assert_eq!(std::fs::read(&path).unwrap(), b"weights");
      assert!(!partial_path(&path).exists());
    }

    #[test]
    fn failed_download_leaves_nothing() {
      let dir = tempdir().unwrap();
      let path = dir.path().join("herbal.onnx");
      let artifact =
        ModelArtifact::new(&path).with_remote(Some(serve_once("404 Not Found", b"")));

      assert!(matches!(
        artifact.ensure_local(),
        Err(ArtifactError::FetchError(_))
      ));
      assert!(!path.exists());
      assert!(!partial_path(&path).exists());
    }
  }
}
