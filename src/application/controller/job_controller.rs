//! Job Lifecycle Controller
//!
//! 驱动一次跟踪会话：加载题材 → 提交 → 轮询 → 终态。
//!
//! 状态转移:
//! ```text
//! Idle --init--> GenresLoading --(成功|失败)--> Ready
//! Ready --submit(无文件)--> Ready（校验错误）
//! Ready|Done|Failed --submit--> Submitting
//! Submitting --受理--> Polling
//! Submitting --失败--> Ready
//! Polling --中间状态--> Polling
//! Polling --completed--> Done
//! Polling --failed | 查询失败--> Failed
//! 任意 --teardown--> Terminated
//! ```
//!
//! 所有状态修改都在同一把锁内完成，锁从不跨越 await。

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast;

use super::state::{Phase, TrackingSession, ViewState};
use crate::application::error::{user_message, ControllerError};
use crate::application::polling::PollHandle;
use crate::application::ports::JobGatewayPort;
use crate::domain::job::{JobId, JobStatus};
use crate::domain::submission::{AudioFile, GenreCatalog, SubmissionForm, TargetMinutes};
use crate::infrastructure::events::{EventPublisher, JobEvent};

pub const SUBMITTING_TEXT: &str = "Uploading and creating job...";
pub const ACCEPTED_TEXT: &str = "Job accepted. Processing started.";
pub const GENRES_UNAVAILABLE_MESSAGE: &str = "Could not load genres from backend.";
pub const JOB_FAILED_MESSAGE: &str = "The job failed.";

/// 控制器配置
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// 轮询周期
    pub poll_interval: Duration,
    /// 默认题材
    pub default_genre: String,
    /// 默认目标时长
    pub default_target_minutes: TargetMinutes,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            default_genre: "general".to_string(),
            default_target_minutes: TargetMinutes::DEFAULT,
        }
    }
}

struct Shared {
    gateway: Arc<dyn JobGatewayPort>,
    events: Arc<EventPublisher>,
    poll_interval: Duration,
    session: Mutex<TrackingSession>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TrackingSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 执行一次状态查询并应用结果
    async fn poll_once(&self, job_id: &JobId, generation: u64) -> ControlFlow<()> {
        if self.lock().generation != generation {
            return ControlFlow::Break(());
        }

        let result = self.gateway.get_job_status(job_id).await;

        let mut session = self.lock();
        if session.generation != generation || session.phase != Phase::Polling {
            tracing::debug!(job_id = %job_id, "Dropping status for superseded session");
            return ControlFlow::Break(());
        }

        match result {
            Ok(snapshot) => {
                let status = snapshot.status.clone();
                // 即使状态未变也刷新文本
                session.status_text = format!("Current status: {}", status);
                session.job = Some(snapshot);
                self.events
                    .publish_status(job_id.as_str(), status.as_str(), &session.status_text);
                tracing::debug!(job_id = %job_id, status = %status, "Job status fetched");
                if !status.is_terminal() {
                    return ControlFlow::Continue(());
                }

                match status {
                    JobStatus::Completed => {
                        let audio_url = self.gateway.audio_url(job_id);
                        session.audio_url = Some(audio_url.clone());
                        session.finish(Phase::Done);
                        self.events.publish_completed(job_id.as_str(), &audio_url);
                        tracing::info!(job_id = %job_id, audio_url = %audio_url, "Job completed");
                        ControlFlow::Break(())
                    }
                    JobStatus::Failed => {
                        let message = session
                            .job
                            .as_ref()
                            .and_then(|job| job.error_message.clone())
                            .filter(|m| !m.is_empty())
                            .unwrap_or_else(|| JOB_FAILED_MESSAGE.to_string());
                        session.error_message = Some(message.clone());
                        session.finish(Phase::Failed);
                        self.events.publish_failed(Some(job_id.as_str()), &message);
                        tracing::warn!(job_id = %job_id, error = %message, "Job failed");
                        ControlFlow::Break(())
                    }
                    _ => ControlFlow::Continue(()),
                }
            }
            Err(err) => {
                let message = user_message(&err);
                session.error_message = Some(message.clone());
                session.finish(Phase::Failed);
                self.events.publish_failed(Some(job_id.as_str()), &message);
                tracing::error!(job_id = %job_id, error = %err, "Status fetch failed, tracking stopped");
                ControlFlow::Break(())
            }
        }
    }
}

/// 题材加载中途被放弃时退回 Idle，允许再次 init
struct InitGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.shared.lock();
        if session.phase == Phase::GenresLoading {
            session.phase = Phase::Idle;
            tracing::warn!("Genre loading abandoned before completion");
        }
    }
}

/// 提交中途被放弃（调用方丢弃了 future）时恢复为可提交状态
struct SubmitGuard<'a> {
    shared: &'a Shared,
    generation: u64,
    armed: bool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.shared.lock();
        if session.generation == self.generation && session.phase == Phase::Submitting {
            session.busy = false;
            session.phase = Phase::Ready;
            session.status_text.clear();
            tracing::warn!(generation = self.generation, "Submission abandoned before completion");
        }
    }
}

/// 任务生命周期控制器
///
/// 一个控制器对应一个跟踪会话，同一时刻最多只有一个任务在轮询。
/// 控制器被丢弃时自动执行 `teardown`。
pub struct JobController {
    shared: Arc<Shared>,
}

impl JobController {
    pub fn new(
        gateway: Arc<dyn JobGatewayPort>,
        config: ControllerConfig,
        events: Arc<EventPublisher>,
    ) -> Self {
        let form = SubmissionForm::new(config.default_genre, config.default_target_minutes);
        Self {
            shared: Arc::new(Shared {
                gateway,
                events,
                poll_interval: config.poll_interval,
                session: Mutex::new(TrackingSession::new(form)),
            }),
        }
    }

    /// 订阅生命周期事件
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.shared.events.subscribe()
    }

    /// 当前视图状态
    pub fn view(&self) -> ViewState {
        self.shared.lock().view()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    pub fn is_busy(&self) -> bool {
        self.shared.lock().busy
    }

    pub fn is_polling(&self) -> bool {
        self.shared.lock().is_polling()
    }

    /// 初始化会话：拉取题材目录
    ///
    /// 只在 Idle 阶段生效，失败时记录错误并仍然进入 Ready。
    /// 调用被中途放弃时回到 Idle
    pub async fn init(&self) {
        {
            let mut session = self.shared.lock();
            if session.phase != Phase::Idle {
                tracing::debug!(phase = %session.phase, "Session already initialised");
                return;
            }
            session.phase = Phase::GenresLoading;
        }

        let mut loading = InitGuard {
            shared: &*self.shared,
            armed: true,
        };
        let result = self.shared.gateway.list_genres().await;
        loading.armed = false;

        let mut guard = self.shared.lock();
        if guard.phase != Phase::GenresLoading {
            return;
        }
        let session = &mut *guard;
        match result {
            Ok(genres) => {
                session.catalog = GenreCatalog::new(genres);
                session.form.apply_catalog(&session.catalog);
                self.shared
                    .events
                    .publish_genres_loaded(session.catalog.genres(), session.form.genre());
                tracing::info!(
                    count = session.catalog.genres().len(),
                    selected = %session.form.genre(),
                    "Genres loaded"
                );
            }
            Err(err) => {
                session.error_message = Some(GENRES_UNAVAILABLE_MESSAGE.to_string());
                self.shared
                    .events
                    .publish_genres_unavailable(GENRES_UNAVAILABLE_MESSAGE);
                tracing::warn!(error = %err, "Failed to load genres");
            }
        }
        session.phase = Phase::Ready;
    }

    /// 选择文件（`None` 表示取消选择）
    ///
    /// 空闲时同时清除上一次尝试的错误、结果地址和任务快照；
    /// 跟踪进行中时只更换下一次提交使用的文件。
    pub fn select_file(&self, file: Option<AudioFile>) -> Result<(), ControllerError> {
        let mut session = self.shared.lock();
        if session.phase == Phase::Terminated {
            return Err(ControllerError::Terminated);
        }
        if !session.busy {
            session.clear_results();
        }
        tracing::debug!(file = ?file, "File selected");
        session.form.select_file(file);
        Ok(())
    }

    /// 选择题材
    pub fn set_genre(&self, genre: &str) -> Result<(), ControllerError> {
        let mut guard = self.shared.lock();
        if guard.phase == Phase::Terminated {
            return Err(ControllerError::Terminated);
        }
        let session = &mut *guard;
        session.form.set_genre(genre, &session.catalog)?;
        Ok(())
    }

    /// 设置目标时长（分钟）
    pub fn set_target_minutes(&self, minutes: u32) -> Result<(), ControllerError> {
        let mut session = self.shared.lock();
        if session.phase == Phase::Terminated {
            return Err(ControllerError::Terminated);
        }
        session.form.set_target_minutes(minutes)?;
        Ok(())
    }

    /// 提交任务
    ///
    /// 受理后启动轮询并返回任务 ID。后端拒绝时错误文本同时写入视图状态。
    pub async fn submit(&self) -> Result<JobId, ControllerError> {
        let (file, genre, target_minutes, generation) = {
            let mut session = self.shared.lock();
            if session.phase == Phase::Terminated {
                return Err(ControllerError::Terminated);
            }
            if session.busy {
                tracing::warn!(phase = %session.phase, "Submit ignored while busy");
                return Err(ControllerError::Busy);
            }
            if !session.phase.accepts_submission() {
                return Err(ControllerError::NotReady("genre catalog has not been loaded"));
            }

            session.clear_results();
            let file = match session.form.require_file().map(AudioFile::clone) {
                Ok(file) => file,
                Err(err) => {
                    session.error_message = Some(err.to_string());
                    return Err(err.into());
                }
            };

            session.generation += 1;
            session.busy = true;
            session.phase = Phase::Submitting;
            session.status_text = SUBMITTING_TEXT.to_string();
            (
                file,
                session.form.genre().to_string(),
                session.form.target_minutes(),
                session.generation,
            )
        };

        self.shared
            .events
            .publish_submitting(file.file_name(), &genre, target_minutes.get());
        tracing::info!(
            file = %file.file_name(),
            size = file.len(),
            genre = %genre,
            target_minutes = target_minutes.get(),
            "Submitting job"
        );

        let mut guard = SubmitGuard {
            shared: &*self.shared,
            generation,
            armed: true,
        };
        let result = self
            .shared
            .gateway
            .create_job(&file, &genre, target_minutes)
            .await;
        guard.armed = false;

        let mut session = self.shared.lock();
        if session.generation != generation || session.phase != Phase::Submitting {
            tracing::debug!("Session torn down during submission, result dropped");
            return Err(ControllerError::Terminated);
        }

        match result {
            Ok(accepted) => {
                let job_id = accepted.job_id;
                session.stop_polling();
                session.job_id = Some(job_id.clone());
                session.status_text = ACCEPTED_TEXT.to_string();
                session.phase = Phase::Polling;
                session.poll = Some(Self::start_polling(
                    &self.shared,
                    job_id.clone(),
                    generation,
                ));
                self.shared.events.publish_accepted(job_id.as_str());
                tracing::info!(job_id = %job_id, status = %accepted.status, "Job accepted");
                Ok(job_id)
            }
            Err(err) => {
                let message = user_message(&err);
                session.busy = false;
                session.phase = Phase::Ready;
                session.error_message = Some(message.clone());
                self.shared.events.publish_failed(None, &message);
                tracing::warn!(error = %err, "Job creation failed");
                Err(ControllerError::Rejected(message))
            }
        }
    }

    /// 销毁会话：无条件停止轮询
    ///
    /// 幂等，没有轮询时什么也不做
    pub fn teardown(&self) {
        let mut session = self.shared.lock();
        if session.stop_polling() {
            tracing::debug!("Pending poll cancelled");
        }
        if session.phase != Phase::Terminated {
            session.generation += 1;
            session.busy = false;
            session.phase = Phase::Terminated;
            self.shared.events.publish_terminated();
            tracing::info!("Tracking session terminated");
        }
    }

    fn start_polling(shared: &Arc<Shared>, job_id: JobId, generation: u64) -> PollHandle {
        let weak: Weak<Shared> = Arc::downgrade(shared);
        PollHandle::start(shared.poll_interval, move || {
            let weak = weak.clone();
            let job_id = job_id.clone();
            async move {
                match weak.upgrade() {
                    Some(shared) => shared.poll_once(&job_id, generation).await,
                    None => ControlFlow::Break(()),
                }
            }
        })
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::FALLBACK_ERROR_MESSAGE;
    use crate::application::ports::{ErrorBody, GatewayError};
    use crate::domain::job::{JobAccepted, JobSnapshot};
    use crate::infrastructure::adapters::{GatewayCall, ScriptedJobGateway};
    use tokio::time::sleep;

    const BASE_URL: &str = "http://api.test/api/v1";

    fn gateway() -> Arc<ScriptedJobGateway> {
        Arc::new(ScriptedJobGateway::new(BASE_URL))
    }

    fn controller(gateway: Arc<ScriptedJobGateway>) -> JobController {
        JobController::new(gateway, ControllerConfig::default(), EventPublisher::new().arc())
    }

    fn accepted(id: &str) -> Result<JobAccepted, GatewayError> {
        Ok(JobAccepted {
            job_id: JobId::new(id),
            status: JobStatus::Pending,
        })
    }

    fn status(status: &str) -> Result<JobSnapshot, GatewayError> {
        Ok(JobSnapshot::new(JobStatus::from(status)))
    }

    fn audio() -> AudioFile {
        AudioFile::new("talk.wav", vec![1, 2, 3, 4])
    }

    async fn ready_controller(gateway: &Arc<ScriptedJobGateway>) -> JobController {
        gateway.push_genres(Ok(vec!["general".to_string(), "news".to_string()]));
        let controller = controller(gateway.clone());
        controller.init().await;
        controller
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_poll_complete_scenario() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway
            .push_create(accepted("abc123"))
            .push_status(status("processing"))
            .push_status(status("completed"));

        controller.select_file(Some(audio())).unwrap();
        let job_id = controller.submit().await.unwrap();
        assert_eq!(job_id.as_str(), "abc123");

        let view = controller.view();
        assert_eq!(view.phase, Phase::Polling);
        assert_eq!(view.status_text, ACCEPTED_TEXT);
        assert!(view.busy);
        assert!(view.polling);

        sleep(Duration::from_millis(3_100)).await;
        let view = controller.view();
        assert_eq!(view.status_text, "Current status: processing");
        assert!(view.busy);
        assert!(view.audio_url.is_none());

        sleep(Duration::from_millis(3_000)).await;
        let view = controller.view();
        assert_eq!(view.phase, Phase::Done);
        assert!(!view.busy);
        assert!(!view.polling);
        assert_eq!(
            view.audio_url.as_deref(),
            Some("http://api.test/api/v1/jobs/abc123/audio")
        );

        // 终态之后不再查询
        sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.status_calls(), 2);

        assert_eq!(
            gateway.calls()[1],
            GatewayCall::CreateJob {
                file_name: "talk.wav".to_string(),
                genre: "general".to_string(),
                target_minutes: 3,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_without_file_is_local_validation_error() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;

        let result = controller.submit().await;
        assert!(matches!(result, Err(ControllerError::Validation(_))));

        let view = controller.view();
        assert_eq!(
            view.error_message.as_deref(),
            Some("Please choose an audio file first.")
        );
        assert_eq!(view.phase, Phase::Ready);
        assert!(!view.busy);
        assert_eq!(gateway.calls(), vec![GatewayCall::ListGenres]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_creation_surfaces_detail() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway.push_create(Err(GatewayError::rejected(
            400,
            Some(ErrorBody::with_detail("invalid file type")),
        )));

        controller.select_file(Some(audio())).unwrap();
        let result = controller.submit().await;
        assert!(matches!(&result, Err(ControllerError::Rejected(m)) if m == "invalid file type"));

        let view = controller.view();
        assert_eq!(view.error_message.as_deref(), Some("invalid file type"));
        assert_eq!(view.phase, Phase::Ready);
        assert!(!view.busy);
        assert!(!view.polling);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(gateway.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_fetch_failure_stops_tracking() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway
            .push_create(accepted("abc123"))
            .push_status(Err(GatewayError::Transport("connection reset".into())));

        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();

        sleep(Duration::from_millis(3_100)).await;
        let view = controller.view();
        assert_eq!(view.phase, Phase::Failed);
        assert_eq!(view.error_message.as_deref(), Some(FALLBACK_ERROR_MESSAGE));
        assert!(!view.busy);
        assert!(!view.polling);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(gateway.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_uses_server_message_or_default() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway
            .push_create(accepted("job-1"))
            .push_status(Ok(
                JobSnapshot::new(JobStatus::Failed).with_error("transcription failed")
            ))
            .push_create(accepted("job-2"))
            .push_status(status("failed"));

        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();
        sleep(Duration::from_millis(3_100)).await;
        assert_eq!(controller.phase(), Phase::Failed);
        assert_eq!(
            controller.view().error_message.as_deref(),
            Some("transcription failed")
        );

        controller.submit().await.unwrap();
        sleep(Duration::from_millis(3_100)).await;
        assert_eq!(
            controller.view().error_message.as_deref(),
            Some(JOB_FAILED_MESSAGE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_text_tracks_latest_fetch() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway.push_create(accepted("abc123"));
        for s in ["pending", "running", "running", "processing"] {
            gateway.push_status(status(s));
        }

        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();
        sleep(Duration::from_millis(100)).await;

        for expected in ["pending", "running", "running", "processing"] {
            sleep(Duration::from_secs(3)).await;
            assert_eq!(
                controller.view().status_text,
                format!("Current status: {}", expected)
            );
            assert!(controller.is_busy());
            assert!(controller.is_polling());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submit_while_busy_is_rejected() {
        let gateway = Arc::new(
            ScriptedJobGateway::new(BASE_URL).with_latency(Duration::from_secs(1)),
        );
        gateway.push_genres(Ok(vec![]));
        gateway.push_create(accepted("abc123"));
        let controller = Arc::new(controller(gateway.clone()));
        controller.init().await;
        controller.select_file(Some(audio())).unwrap();

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit().await })
        };
        sleep(Duration::from_millis(100)).await;
        assert_eq!(controller.phase(), Phase::Submitting);

        let second = controller.submit().await;
        assert!(matches!(second, Err(ControllerError::Busy)));
        assert_eq!(controller.view().status_text, SUBMITTING_TEXT);

        assert_eq!(first.await.unwrap().unwrap().as_str(), "abc123");
        let creates = gateway
            .calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::CreateJob { .. }))
            .count();
        assert_eq!(creates, 1);
        controller.teardown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_is_idempotent_and_stops_polling() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway.push_create(accepted("abc123"));

        // 没有轮询时销毁也不报错
        controller.teardown();
        controller.teardown();
        assert_eq!(controller.phase(), Phase::Terminated);
        assert!(matches!(
            controller.submit().await,
            Err(ControllerError::Terminated)
        ));

        let gateway = self::gateway();
        let controller = ready_controller(&gateway).await;
        gateway.push_create(accepted("abc123"));
        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();
        assert!(controller.is_polling());

        controller.teardown();
        controller.teardown();
        assert!(!controller.is_polling());
        assert!(!controller.is_busy());

        sleep(Duration::from_secs(30)).await;
        assert_eq!(gateway.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_during_fetch_discards_result() {
        let gateway = Arc::new(
            ScriptedJobGateway::new(BASE_URL).with_latency(Duration::from_secs(2)),
        );
        gateway.push_genres(Ok(vec![]));
        gateway
            .push_create(accepted("abc123"))
            .push_status(status("completed"));
        let controller = controller(gateway.clone());
        controller.init().await;
        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();

        // 第一次 tick 在 3s 触发，请求需要 2s
        sleep(Duration::from_secs(4)).await;
        assert_eq!(gateway.status_calls(), 1);
        controller.teardown();

        sleep(Duration::from_secs(10)).await;
        let view = controller.view();
        assert_eq!(view.phase, Phase::Terminated);
        assert!(view.audio_url.is_none());
        assert_eq!(gateway.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_polling() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway.push_create(accepted("abc123"));
        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();

        drop(controller);
        sleep(Duration::from_secs(30)).await;
        assert_eq!(gateway.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_attempt_clears_previous_results() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        gateway
            .push_create(accepted("abc123"))
            .push_status(status("completed"));

        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();
        sleep(Duration::from_millis(3_100)).await;
        assert!(controller.view().audio_url.is_some());

        controller
            .select_file(Some(AudioFile::new("other.mp3", vec![9])))
            .unwrap();
        let view = controller.view();
        assert!(view.audio_url.is_none());
        assert!(view.error_message.is_none());
        assert!(view.job.is_none());
        assert_eq!(view.file_name.as_deref(), Some("other.mp3"));

        // 再次提交失败时不会残留旧结果
        gateway.push_create(Err(GatewayError::rejected(500, None)));
        assert!(controller.submit().await.is_err());
        let view = controller.view();
        assert!(view.audio_url.is_none());
        assert!(view.job_id.is_none());
        assert_eq!(view.error_message.as_deref(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_submit_releases_busy() {
        let gateway = Arc::new(
            ScriptedJobGateway::new(BASE_URL).with_latency(Duration::from_secs(5)),
        );
        gateway.push_genres(Ok(vec![]));
        gateway.push_create(accepted("abc123"));
        let controller = controller(gateway.clone());
        controller.init().await;
        controller.select_file(Some(audio())).unwrap();

        let abandoned = tokio::time::timeout(Duration::from_secs(1), controller.submit()).await;
        assert!(abandoned.is_err());

        let view = controller.view();
        assert_eq!(view.phase, Phase::Ready);
        assert!(!view.busy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_init_can_retry() {
        let gateway = Arc::new(
            ScriptedJobGateway::new(BASE_URL).with_latency(Duration::from_secs(5)),
        );
        gateway.push_genres(Ok(vec!["news".to_string()]));
        gateway.push_genres(Ok(vec!["news".to_string()]));
        gateway.push_create(accepted("abc123"));
        let controller = controller(gateway.clone());

        let abandoned = tokio::time::timeout(Duration::from_secs(1), controller.init()).await;
        assert!(abandoned.is_err());
        assert_eq!(controller.phase(), Phase::Idle);

        controller.init().await;
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.view().genre, "news");

        controller.select_file(Some(audio())).unwrap();
        assert_eq!(controller.submit().await.unwrap().as_str(), "abc123");
        controller.teardown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_genres_rederive_default_selection() {
        let gateway = gateway();
        gateway.push_genres(Ok(vec!["news".to_string(), "social".to_string()]));
        let controller = controller(gateway.clone());
        let mut events = controller.subscribe();
        controller.init().await;

        let view = controller.view();
        assert_eq!(view.phase, Phase::Ready);
        assert_eq!(view.genre, "news");
        assert_eq!(view.genres, vec!["news", "social"]);
        assert_eq!(
            events.recv().await.unwrap(),
            JobEvent::GenresLoaded {
                genres: vec!["news".to_string(), "social".to_string()],
                selected: "news".to_string(),
            }
        );

        assert!(controller.set_genre("social").is_ok());
        assert!(matches!(
            controller.set_genre("poetry"),
            Err(ControllerError::Validation(_))
        ));
        assert!(controller.set_target_minutes(0).is_err());
        assert!(controller.set_target_minutes(12).is_ok());
        assert_eq!(controller.view().target_minutes, 12);

        // 只加载一次
        controller.init().await;
        assert_eq!(gateway.calls(), vec![GatewayCall::ListGenres]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_genres_failure_still_ready() {
        let gateway = gateway();
        gateway.push_genres(Err(GatewayError::Transport("refused".into())));
        let controller = controller(gateway.clone());

        assert!(matches!(
            controller.submit().await,
            Err(ControllerError::NotReady(_))
        ));

        controller.init().await;
        let view = controller.view();
        assert_eq!(view.phase, Phase::Ready);
        assert_eq!(view.genre, "general");
        assert!(view.genres.is_empty());
        assert_eq!(
            view.error_message.as_deref(),
            Some(GENRES_UNAVAILABLE_MESSAGE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_sequence() {
        let gateway = gateway();
        let controller = ready_controller(&gateway).await;
        let mut events = controller.subscribe();
        gateway
            .push_create(accepted("abc123"))
            .push_status(status("running"))
            .push_status(status("completed"));

        controller.select_file(Some(audio())).unwrap();
        controller.submit().await.unwrap();
        sleep(Duration::from_secs(7)).await;

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert!(matches!(received[0], JobEvent::Submitting { .. }));
        assert!(matches!(&received[1], JobEvent::Accepted { job_id } if job_id == "abc123"));
        assert!(matches!(&received[2], JobEvent::StatusUpdated { status, .. } if status == "running"));
        assert!(matches!(&received[3], JobEvent::StatusUpdated { status, .. } if status == "completed"));
        assert_eq!(
            received[4],
            JobEvent::Completed {
                job_id: "abc123".to_string(),
                audio_url: "http://api.test/api/v1/jobs/abc123/audio".to_string(),
            }
        );
        assert_eq!(received.len(), 5);
    }
}
