//! Scripted Job Gateway - 按脚本应答的网关
//!
//! 不发出任何网络请求：每个操作按入队顺序返回预先设定的结果，
//! 并记录收到的调用，便于断言"没有发出请求"、"只查询了 N 次"等行为。

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{GatewayError, JobGatewayPort};
use crate::domain::job::{JobAccepted, JobId, JobSnapshot};
use crate::domain::submission::{AudioFile, TargetMinutes};

/// 网关收到的调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListGenres,
    CreateJob {
        file_name: String,
        genre: String,
        target_minutes: u32,
    },
    GetJobStatus(JobId),
}

#[derive(Default)]
struct Script {
    genres: VecDeque<Result<Vec<String>, GatewayError>>,
    creates: VecDeque<Result<JobAccepted, GatewayError>>,
    statuses: VecDeque<Result<JobSnapshot, GatewayError>>,
    calls: Vec<GatewayCall>,
}

/// 脚本网关
pub struct ScriptedJobGateway {
    base_url: String,
    latency: Duration,
    script: Mutex<Script>,
}

impl ScriptedJobGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            latency: Duration::ZERO,
            script: Mutex::new(Script::default()),
        }
    }

    /// 每次调用前等待的时长（模拟网络延迟）
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push_genres(&self, result: Result<Vec<String>, GatewayError>) -> &Self {
        self.lock().genres.push_back(result);
        self
    }

    pub fn push_create(&self, result: Result<JobAccepted, GatewayError>) -> &Self {
        self.lock().creates.push_back(result);
        self
    }

    pub fn push_status(&self, result: Result<JobSnapshot, GatewayError>) -> &Self {
        self.lock().statuses.push_back(result);
        self
    }

    /// 已收到的全部调用
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// 状态查询次数
    pub fn status_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::GetJobStatus(_)))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn exhausted(operation: &str) -> GatewayError {
        GatewayError::Transport(format!("No scripted response for {}", operation))
    }
}

#[async_trait]
impl JobGatewayPort for ScriptedJobGateway {
    async fn list_genres(&self) -> Result<Vec<String>, GatewayError> {
        self.lock().calls.push(GatewayCall::ListGenres);
        self.delay().await;
        self.lock()
            .genres
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted("list_genres")))
    }

    async fn create_job(
        &self,
        file: &AudioFile,
        genre: &str,
        target_minutes: TargetMinutes,
    ) -> Result<JobAccepted, GatewayError> {
        self.lock().calls.push(GatewayCall::CreateJob {
            file_name: file.file_name().to_string(),
            genre: genre.to_string(),
            target_minutes: target_minutes.get(),
        });
        self.delay().await;
        self.lock()
            .creates
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted("create_job")))
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<JobSnapshot, GatewayError> {
        self.lock()
            .calls
            .push(GatewayCall::GetJobStatus(job_id.clone()));
        self.delay().await;
        self.lock()
            .statuses
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted("get_job_status")))
    }

    fn audio_url(&self, job_id: &JobId) -> String {
        format!("{}/jobs/{}/audio", self.base_url, job_id)
    }
}
