//! Event Publisher Implementation
//!
//! 控制器状态变更事件的广播，视图层订阅后渲染

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// 事件通道容量
const CHANNEL_CAPACITY: usize = 100;

/// 任务生命周期事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum JobEvent {
    /// 题材目录加载完成
    GenresLoaded {
        genres: Vec<String>,
        selected: String,
    },
    /// 题材目录加载失败
    GenresUnavailable { error: String },
    /// 开始上传并创建任务
    Submitting {
        file_name: String,
        genre: String,
        target_minutes: u32,
    },
    /// 后端已受理
    Accepted { job_id: String },
    /// 一次状态查询成功
    StatusUpdated {
        job_id: String,
        status: String,
        status_text: String,
    },
    /// 任务完成
    Completed { job_id: String, audio_url: String },
    /// 创建失败、任务失败或状态查询失败
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        job_id: Option<String>,
        error: String,
    },
    /// 会话销毁
    Terminated,
}

impl JobEvent {
    /// 是否为跟踪结束的事件
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            JobEvent::Completed { .. } | JobEvent::Failed { .. } | JobEvent::Terminated
        )
    }
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<JobEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.channel.subscribe()
    }

    pub fn publish_genres_loaded(&self, genres: &[String], selected: &str) {
        self.publish(JobEvent::GenresLoaded {
            genres: genres.to_vec(),
            selected: selected.to_string(),
        });
    }

    pub fn publish_genres_unavailable(&self, error: &str) {
        self.publish(JobEvent::GenresUnavailable {
            error: error.to_string(),
        });
    }

    pub fn publish_submitting(&self, file_name: &str, genre: &str, target_minutes: u32) {
        self.publish(JobEvent::Submitting {
            file_name: file_name.to_string(),
            genre: genre.to_string(),
            target_minutes,
        });
    }

    pub fn publish_accepted(&self, job_id: &str) {
        self.publish(JobEvent::Accepted {
            job_id: job_id.to_string(),
        });
    }

    pub fn publish_status(&self, job_id: &str, status: &str, status_text: &str) {
        self.publish(JobEvent::StatusUpdated {
            job_id: job_id.to_string(),
            status: status.to_string(),
            status_text: status_text.to_string(),
        });
    }

    pub fn publish_completed(&self, job_id: &str, audio_url: &str) {
        self.publish(JobEvent::Completed {
            job_id: job_id.to_string(),
            audio_url: audio_url.to_string(),
        });
    }

    pub fn publish_failed(&self, job_id: Option<&str>, error: &str) {
        self.publish(JobEvent::Failed {
            job_id: job_id.map(str::to_string),
            error: error.to_string(),
        });
    }

    pub fn publish_terminated(&self) {
        self.publish(JobEvent::Terminated);
    }

    fn publish(&self, event: JobEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(event = ?e.0, "No event subscribers");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
