// 该文件是 Baicao （百草） 项目的一部分。
// src/output/message.rs - 面向用户的判定消息
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

use std::fmt::Write;

use crate::{
  classify::{ClassifyError, Decision},
  output::Outcome,
};

pub fn describe_decision(name: &str, decision: &Decision) -> String {
  let prediction = decision.prediction();
  match decision {
    Decision::Accepted { uses, .. } => {
      let mut message = format!(
        "{}: identified as {} (confidence {:.2})",
        name, prediction.class_name, prediction.confidence
      );
      for item in uses {
        let _ = write!(message, "\n  - {}", item);
      }
      message
    }
    Decision::Rejected { .. } => format!(
      "{}: not a recognized plant (confidence {:.2})",
      name, prediction.confidence
    ),
  }
}

/// 面向用户的错误说明；内部细节只写入日志
pub fn describe_error(error: &ClassifyError) -> String {
  match error {
    ClassifyError::InvalidImage(_) => "the file is not a readable image".to_string(),
    ClassifyError::Inference(_) => "the model failed to process the image".to_string(),
    ClassifyError::OutputMismatch { expected, actual } => format!(
      "the model returned {} scores for {} known plants",
      actual, expected
    ),
    ClassifyError::EmptyOutput => "the model returned no usable scores".to_string(),
  }
}

pub fn describe(name: &str, outcome: &Outcome) -> String {
  match outcome {
    Ok(decision) => describe_decision(name, decision),
    Err(e) => format!("{}: could not classify upload: {}", name, describe_error(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::classify::{ClassifyError, Prediction};

  fn prediction(confidence: f32, accepted: bool) -> Prediction {
    Prediction {
      class_index: 2,
      class_name: "Tulsi".to_string(),
      confidence,
      accepted,
    }
  }

  #[test]
  fn accepted_lists_uses() {
    let decision = Decision::Accepted {
      prediction: prediction(0.912, true),
      uses: vec!["Cold and cough".to_string(), "Immunity".to_string()],
    };
    assert_eq!(
      describe("leaf.jpg", &Ok(decision)),
      "leaf.jpg: identified as Tulsi (confidence 0.91)\n  - Cold and cough\n  - Immunity"
    );
  }

  #[test]
  fn rejected_shows_confidence() {
    let decision = Decision::Rejected {
      prediction: prediction(0.4, false),
    };
    assert_eq!(
      describe("leaf.jpg", &Ok(decision)),
      "leaf.jpg: not a recognized plant (confidence 0.40)"
    );
  }

  #[test]
  fn errors_are_reported() {
    let outcome: Outcome = Err(ClassifyError::EmptyOutput);
    assert_eq!(
      describe("leaf.jpg", &outcome),
      "leaf.jpg: could not classify upload: the model returned no usable scores"
    );

    let outcome: Outcome = Err(ClassifyError::OutputMismatch {
      expected: 10,
      actual: 5,
    });
    assert_eq!(
      describe("leaf.jpg", &outcome),
      "leaf.jpg: could not classify upload: the model returned 5 scores for 10 known plants"
    );
  }
}
