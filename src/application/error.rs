//! 应用层错误定义
//!
//! 控制器操作的错误类型，以及把网关错误映射为用户可见文本的规则

use serde_json::Value;
use thiserror::Error;

use crate::application::ports::GatewayError;
use crate::domain::submission::SubmissionError;

/// 无法从错误中提取信息时的兜底文本
pub const FALLBACK_ERROR_MESSAGE: &str = "Unexpected error";

/// 控制器错误
#[derive(Debug, Error)]
pub enum ControllerError {
    /// 本地校验失败，不会发出网络请求
    #[error("{0}")]
    Validation(#[from] SubmissionError),

    /// 后端拒绝或请求失败，携带已归一化的用户可见文本
    #[error("{0}")]
    Rejected(String),

    /// 已有任务在提交或轮询中
    #[error("A job is already being submitted or tracked")]
    Busy,

    /// 会话尚未初始化完成
    #[error("Session is not ready: {0}")]
    NotReady(&'static str),

    /// 会话已销毁
    #[error("Session has been torn down")]
    Terminated,
}

/// 把网关错误映射为用户可见文本
///
/// 优先取 `detail`，其次 `message`，都没有时返回兜底文本
pub fn user_message(err: &GatewayError) -> String {
    err.body()
        .and_then(|body| {
            body.detail
                .as_ref()
                .and_then(value_text)
                .or_else(|| body.message.as_ref().and_then(value_text))
        })
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

/// 空值和空字符串视为缺失；非字符串值按 JSON 文本输出
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
