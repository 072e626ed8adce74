//! Job Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobStatus};

/// 创建任务后后端返回的受理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: JobId,
    /// 缺省时视为 pending
    #[serde(default)]
    pub status: JobStatus,
}

/// 任务快照 - 一次状态查询的结果
///
/// 除 `status` 外的字段都是可选的，后端未返回时保持 `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub job_id: Option<JobId>,
    pub status: JobStatus,
    /// 失败原因（仅 failed 时有意义）
    #[serde(default)]
    pub error_message: Option<String>,
    /// 后端给出的音频相对地址（控制器不使用，最终地址由网关构造）
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub summary_text: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub target_minutes: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    /// 创建只有状态的快照
    pub fn new(status: JobStatus) -> Self {
        Self {
            job_id: None,
            status,
            error_message: None,
            audio_url: None,
            summary_text: None,
            genre: None,
            target_minutes: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}
