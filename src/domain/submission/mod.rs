//! Submission Context - 提交表单限界上下文
//!
//! 职责:
//! - 题材目录（genre catalog）与默认题材的推导
//! - 目标时长、音频文件等表单值的本地校验

mod catalog;
mod errors;
mod form;
mod value_objects;

pub use catalog::GenreCatalog;
pub use errors::SubmissionError;
pub use form::SubmissionForm;
pub use value_objects::{AudioFile, AudioFormat, TargetMinutes};
