// 该文件是 Baicao （百草） 项目的一部分。
// src/task.rs - 分类任务
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

use tracing::{error, info, warn};

use crate::{
  classify::{Classifier, Decision},
  frame::ClassifierFrame,
  input::Upload,
  model::Model,
  output::{Outcome, Render},
};

/// 任务结束时的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
  pub uploads: usize,
  pub accepted: usize,
  pub rejected: usize,
  pub failed: usize,
}

impl TaskSummary {
  fn record(&mut self, outcome: &Outcome) {
    self.uploads += 1;
    match outcome {
      Ok(Decision::Accepted { .. }) => self.accepted += 1,
      Ok(Decision::Rejected { .. }) => self.rejected += 1,
      Err(_) => self.failed += 1,
    }
  }
}

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, classifier: &Classifier<M>, output: O)
  -> Result<TaskSummary, Self::Error>;
}

/// 分类一次上传并渲染结果；上传无法解码时同样渲染为消息
fn classify_upload<M, O, RE>(
  upload: &Upload,
  classifier: &Classifier<M>,
  output: &O,
  summary: &mut TaskSummary,
) -> anyhow::Result<()>
where
  M: Model<Input = ClassifierFrame>,
  M::Output: AsRef<[f32]>,
  M::Error: std::error::Error + Send + Sync + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<Upload, Outcome, Error = RE>,
{
  let now = std::time::Instant::now();
  let outcome = classifier.classify(&upload.bytes);
  let elapsed = now.elapsed();
  match &outcome {
    Ok(decision) => info!(
      "{} 分类完成，耗时: {:.2?}, 类别: {}, 置信度: {:.2}",
      upload.name,
      elapsed,
      decision.prediction().class_name,
      decision.prediction().confidence
    ),
    Err(e) => warn!("{} 分类失败: {}", upload.name, e),
  }
  summary.record(&outcome);
  output.render_result(upload, &outcome)?;
  Ok(())
}

pub struct OneShotTask;

impl<I, M, O, IE, RE> Task<I, M, O> for OneShotTask
where
  I: Iterator<Item = Result<Upload, IE>>,
  IE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = ClassifierFrame>,
  M::Output: AsRef<[f32]>,
  M::Error: std::error::Error + Send + Sync + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<Upload, Outcome, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    classifier: &Classifier<M>,
    output: O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let upload = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))??;
    info!("上传读取成功: {}", upload.name);

    let mut summary = TaskSummary::default();
    classify_upload(&upload, classifier, &output, &mut summary)?;

    info!("任务完成");
    Ok(summary)
  }
}

/// 逐个分类所有上传，单个上传的错误不会中断任务
#[derive(Default, Debug)]
pub struct BatchTask {
  limit: Option<usize>,
  stop: Option<Arc<AtomicBool>>,
}

impl BatchTask {
  pub fn with_limit(mut self, limit: Option<usize>) -> Self {
    self.limit = limit;
    self
  }

  /// 标志被置位后，在下一次上传前退出
  pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
    self.stop = Some(stop);
    self
  }

  fn stopped(&self) -> bool {
    self
      .stop
      .as_ref()
      .map(|flag| flag.load(Ordering::SeqCst))
      .unwrap_or(false)
  }
}

impl<I, M, O, IE, RE> Task<I, M, O> for BatchTask
where
  I: Iterator<Item = Result<Upload, IE>>,
  IE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = ClassifierFrame>,
  M::Output: AsRef<[f32]>,
  M::Error: std::error::Error + Send + Sync + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<Upload, Outcome, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    classifier: &Classifier<M>,
    output: O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let mut summary = TaskSummary::default();

    loop {
      if self.stopped() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
      if self.limit.is_some_and(|n| summary.uploads >= n) {
        info!("达到指定数量 {}, 退出任务循环", summary.uploads);
        break;
      }

      let Some(item) = input.next() else {
        break;
      };
      match item {
        Ok(upload) => classify_upload(&upload, classifier, &output, &mut summary)?,
        Err(e) => {
          error!("读取上传失败: {}", e);
          summary.uploads += 1;
          summary.failed += 1;
        }
      }
    }

    info!(
      "任务完成: 共 {} 个上传, 识别 {}, 拒绝 {}, 失败 {}",
      summary.uploads, summary.accepted, summary.rejected, summary.failed
    );
    Ok(summary)
  }
}
