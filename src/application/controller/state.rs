//! Tracking Session State
//!
//! 控制器内部的可变状态，以及对视图公开的只读快照

use serde::Serialize;

use crate::application::polling::PollHandle;
use crate::domain::job::{JobId, JobSnapshot};
use crate::domain::submission::{GenreCatalog, SubmissionForm};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// 尚未初始化
    Idle,
    /// 正在加载题材目录
    GenresLoading,
    /// 可以提交
    Ready,
    /// 正在上传并创建任务
    Submitting,
    /// 任务已受理，轮询中
    Polling,
    /// 任务完成
    Done,
    /// 任务失败或状态查询失败
    Failed,
    /// 会话已销毁
    Terminated,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::GenresLoading => "genres_loading",
            Phase::Ready => "ready",
            Phase::Submitting => "submitting",
            Phase::Polling => "polling",
            Phase::Done => "done",
            Phase::Failed => "failed",
            Phase::Terminated => "terminated",
        }
    }

    /// 是否允许发起新的提交（忙碌状态另行判断）
    pub fn accepts_submission(&self) -> bool {
        matches!(self, Phase::Ready | Phase::Done | Phase::Failed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 视图状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub phase: Phase,
    pub status_text: String,
    pub error_message: Option<String>,
    pub audio_url: Option<String>,
    pub busy: bool,
    pub polling: bool,
    pub job_id: Option<String>,
    pub job: Option<JobSnapshot>,
    pub genres: Vec<String>,
    pub genre: String,
    pub target_minutes: u32,
    pub file_name: Option<String>,
}

/// 跟踪会话
///
/// 不变量:
/// - `poll` 存在 ⇒ `busy`
/// - 任务进入终态 ⇒ `poll` 为空
/// - 每次提交递增 `generation`，过期的异步结果被丢弃
#[derive(Debug)]
pub(crate) struct TrackingSession {
    pub phase: Phase,
    pub form: SubmissionForm,
    pub catalog: GenreCatalog,
    pub job_id: Option<JobId>,
    pub job: Option<JobSnapshot>,
    pub status_text: String,
    pub error_message: Option<String>,
    pub audio_url: Option<String>,
    pub busy: bool,
    pub poll: Option<PollHandle>,
    pub generation: u64,
}

impl TrackingSession {
    pub fn new(form: SubmissionForm) -> Self {
        Self {
            phase: Phase::Idle,
            form,
            catalog: GenreCatalog::default(),
            job_id: None,
            job: None,
            status_text: String::new(),
            error_message: None,
            audio_url: None,
            busy: false,
            poll: None,
            generation: 0,
        }
    }

    /// 清除上一次尝试留下的错误、结果地址和任务快照
    pub fn clear_results(&mut self) {
        self.error_message = None;
        self.audio_url = None;
        self.job = None;
        self.job_id = None;
    }

    /// 停止轮询并释放句柄，没有轮询时什么也不做
    pub fn stop_polling(&mut self) -> bool {
        match self.poll.take() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// 进入结束阶段：停止轮询并清除忙碌标志
    pub fn finish(&mut self, phase: Phase) {
        self.stop_polling();
        self.busy = false;
        self.phase = phase;
        debug_assert!(self.poll.is_none() && !self.busy);
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(PollHandle::is_active)
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            phase: self.phase,
            status_text: self.status_text.clone(),
            error_message: self.error_message.clone(),
            audio_url: self.audio_url.clone(),
            busy: self.busy,
            polling: self.is_polling(),
            job_id: self.job_id.as_ref().map(|id| id.to_string()),
            job: self.job.clone(),
            genres: self.catalog.genres().to_vec(),
            genre: self.form.genre().to_string(),
            target_minutes: self.form.target_minutes().get(),
            file_name: self.form.file().map(|f| f.file_name().to_string()),
        }
    }
}
