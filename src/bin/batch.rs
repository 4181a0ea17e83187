// 该文件是 Baicao （百草） 项目的一部分。
// src/bin/batch.rs - 批量图像分类
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

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use baicao::{
  FromUrl,
  args::Args,
  classify::Classifier,
  input::InputWrapper,
  model::{ModelHandle, OnnxClassifierBuilder},
  output::OutputWrapper,
  task::{BatchTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  args.log_summary();

  let threshold = args.threshold()?;
  let (catalog, uses) = args.herbarium().context("无法加载数据文件")?.into_parts();
  let builder = OnnxClassifierBuilder::from_url(&args.model)?.remote(args.model_remote.clone());
  let model = ModelHandle::load(builder)?;
  let classifier = Classifier::new(model, catalog, uses, threshold)?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let stop = Arc::new(AtomicBool::new(false));
  let flag = Arc::clone(&stop);
  ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    flag.store(true, Ordering::SeqCst);
  })
  .expect("Error setting Ctrl-C handler");

  let summary = BatchTask::default()
    .with_limit(args.limit)
    .with_stop_flag(stop)
    .run_task(input, &classifier, output)?;

  println!(
    "共 {} 个上传: 识别 {}, 拒绝 {}, 失败 {}",
    summary.uploads, summary.accepted, summary.rejected, summary.failed
  );

  Ok(())
}
