//! Job Context - 任务限界上下文
//!
//! 职责:
//! - 后端分配的任务标识
//! - 任务状态（开放枚举）
//! - 状态查询返回的任务快照

mod entities;
mod value_objects;

pub use entities::{JobAccepted, JobSnapshot};
pub use value_objects::{JobId, JobStatus};
