//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Job Context: 后端任务
//! - Submission Context: 提交表单

pub mod job;
pub mod submission;
