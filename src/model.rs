//! FAQ 数据模型
//!
//! `Faq` 的 `question` 是源语言（默认英文）文本，`answer` 是富文本内容，
//! 不参与翻译。每种语言的译文保存在独立的 `Translation` 中。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FaqError;

/// FAQ 标识符，删除后不会复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaqId(pub u64);

impl fmt::Display for FaqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FaqId {
    type Err = FaqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(FaqId)
            .map_err(|_| FaqError::InvalidInput(format!("无效的FAQ ID: '{}'", s)))
    }
}

/// FAQ 条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: FaqId,
    /// 源语言问题文本
    pub question: String,
    /// 富文本答案
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建 FAQ 请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
}

impl NewFaq {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// FAQ 部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl FaqPatch {
    /// 修改问题文本
    pub fn question(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            answer: None,
        }
    }

    /// 修改答案
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            question: None,
            answer: Some(answer.into()),
        }
    }

    /// 应用到已有 FAQ，返回问题文本是否发生变化
    pub fn apply_to(self, faq: &mut Faq) -> bool {
        let mut question_changed = false;

        if let Some(question) = self.question {
            question_changed = question != faq.question;
            faq.question = question;
        }
        if let Some(answer) = self.answer {
            faq.answer = answer;
        }

        faq.updated_at = Utc::now();
        question_changed
    }
}

impl From<NewFaq> for FaqPatch {
    fn from(faq: NewFaq) -> Self {
        Self {
            question: Some(faq.question),
            answer: Some(faq.answer),
        }
    }
}

/// 更新结果
#[derive(Debug, Clone)]
pub struct FaqUpdate {
    pub faq: Faq,
    /// 源语言文本是否变化
    pub question_changed: bool,
}

/// 单个语言的译文
///
/// 空字符串表示"尚未成功翻译"，读取时会再次尝试翻译。
/// `revision` 在源文本变化导致译文被重置时递增，条件写入据此拒绝过期的译文。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub faq_id: FaqId,
    pub language: String,
    pub translated_text: String,
    #[serde(default)]
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl Translation {
    /// 创建空占位译文
    pub fn placeholder(faq_id: FaqId, language: impl Into<String>) -> Self {
        Self {
            faq_id,
            language: language.into(),
            translated_text: String::new(),
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// 是否已有可用译文
    pub fn is_filled(&self) -> bool {
        !self.translated_text.is_empty()
    }
}

/// 按语言投影后的 FAQ 表示，列表与详情响应的内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqView {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
}

impl FaqView {
    /// 使用给定问题文本渲染
    pub fn render(faq: &Faq, question: String) -> Self {
        Self {
            id: faq.id,
            question,
            answer: faq.answer.clone(),
        }
    }
}
