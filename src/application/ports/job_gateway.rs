//! Job Gateway Port - 后端任务接口抽象
//!
//! 定义与后端交互的四个操作，具体实现在 infrastructure/adapters 层。
//! 网关只负责传输，不解释结果。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::job::{JobAccepted, JobId, JobSnapshot};
use crate::domain::submission::{AudioFile, TargetMinutes};

/// 非 2xx 响应中携带的错误体
///
/// `detail` 可能是字符串，也可能是结构化的校验错误列表，因此保留原始 JSON
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl ErrorBody {
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            detail: None,
            message: Some(Value::String(message.into())),
        }
    }
}

/// 网关错误
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 网络不可达、连接失败、超时
    #[error("Transport error: {0}")]
    Transport(String),

    /// 服务端返回非 2xx
    #[error("Request rejected with HTTP {status}")]
    Rejected {
        status: u16,
        body: Option<ErrorBody>,
    },

    /// 2xx 响应但响应体无法解析
    #[error("Invalid response: {0}")]
    Decode(String),

    /// 本地文件读写失败（仅下载音频时出现）
    #[error("I/O error: {0}")]
    Io(String),
}

impl GatewayError {
    pub fn rejected(status: u16, body: Option<ErrorBody>) -> Self {
        Self::Rejected { status, body }
    }

    /// 错误体（仅 Rejected 且响应为 JSON 时存在）
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            GatewayError::Rejected { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// Job Gateway Port
///
/// 所有操作都基于构造时注入的后端基础地址
#[async_trait]
pub trait JobGatewayPort: Send + Sync {
    /// 列出可用题材
    async fn list_genres(&self) -> Result<Vec<String>, GatewayError>;

    /// 上传音频并创建任务
    async fn create_job(
        &self,
        file: &AudioFile,
        genre: &str,
        target_minutes: TargetMinutes,
    ) -> Result<JobAccepted, GatewayError>;

    /// 查询任务状态
    async fn get_job_status(&self, job_id: &JobId) -> Result<JobSnapshot, GatewayError>;

    /// 构造成品音频地址（纯函数，无失败）
    fn audio_url(&self, job_id: &JobId) -> String;
}
