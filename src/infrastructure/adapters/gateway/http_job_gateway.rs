//! HTTP Job Gateway - 调用后端任务 HTTP 接口
//!
//! 实现 JobGatewayPort trait
//!
//! 后端 API（均相对于配置的 base_url，例如 http://localhost:8000/api/v1）:
//! GET  /jobs/genres          -> {"genres": [...]}
//! POST /jobs                 multipart: audio_file, genre, target_minutes -> {"job_id", "status"}
//! GET  /jobs/{job_id}        -> {"job_id", "status", "error_message", ...}
//! GET  /jobs/{job_id}/audio  -> audio/wav

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{ErrorBody, GatewayError, JobGatewayPort};
use crate::domain::job::{JobAccepted, JobId, JobSnapshot};
use crate::domain::submission::{AudioFile, TargetMinutes};

/// 题材列表响应
#[derive(Debug, Deserialize)]
struct GenreListResponse {
    /// 字段缺失或为 null 时视为空列表
    #[serde(default)]
    genres: Option<Vec<String>>,
}

/// HTTP 网关配置
#[derive(Debug, Clone)]
pub struct HttpJobGatewayConfig {
    /// 后端 API 基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpJobGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 60,
        }
    }
}

impl HttpJobGatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 任务网关
pub struct HttpJobGateway {
    client: Client,
    base_url: String,
}

impl HttpJobGateway {
    /// 创建新的 HTTP 网关
    pub fn new(config: HttpJobGatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("voxsum/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn genres_url(&self) -> String {
        format!("{}/jobs/genres", self.base_url)
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.base_url)
    }

    fn job_url(&self, job_id: &JobId) -> String {
        format!("{}/jobs/{}", self.base_url, job_id)
    }

    /// 健康检查 URL 位于服务根路径，而不是 API 前缀下
    fn health_url(&self) -> Option<Url> {
        Url::parse(&self.base_url).and_then(|u| u.join("/health")).ok()
    }

    /// 检查后端是否可用
    pub async fn health_check(&self) -> bool {
        let Some(url) = self.health_url() else {
            return false;
        };
        match self
            .client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// 下载成品音频到 `dest`，返回写入的字节数
    ///
    /// 失败时删除已写入的部分文件
    pub async fn download_audio(&self, job_id: &JobId, dest: &Path) -> Result<u64, GatewayError> {
        let written = self.download_to(&self.audio_url(job_id), dest).await?;
        tracing::info!(job_id = %job_id, bytes = written, dest = %dest.display(), "Audio downloaded");
        Ok(written)
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, GatewayError> {
        tracing::debug!(url = %url, dest = %dest.display(), "Downloading audio");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| GatewayError::Io(e.to_string()))?;
        let result = write_body(&mut file, response).await;
        drop(file);

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                tracing::warn!(dest = %dest.display(), error = %e, "Failed to remove partial download");
            }
        }
        result
    }

    /// 发送请求并解析 JSON 响应
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// 把响应体流式写入文件，返回写入的字节数
async fn write_body(file: &mut tokio::fs::File, response: reqwest::Response) -> Result<u64, GatewayError> {
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_transport_error)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| GatewayError::Io(e.to_string()))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| GatewayError::Io(e.to_string()))?;
    Ok(written)
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Transport("Request timeout".to_string())
    } else if e.is_connect() {
        GatewayError::Transport(format!("Cannot connect to backend: {}", e))
    } else {
        GatewayError::Transport(e.to_string())
    }
}

/// 非 2xx 转为 Rejected，尽量解析错误体
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .bytes()
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok());
    tracing::debug!(status = status.as_u16(), body = ?body, "Backend rejected request");
    Err(GatewayError::rejected(status.as_u16(), body))
}

#[async_trait]
impl JobGatewayPort for HttpJobGateway {
    async fn list_genres(&self) -> Result<Vec<String>, GatewayError> {
        let response: GenreListResponse =
            self.send_json(self.client.get(self.genres_url())).await?;
        Ok(response.genres.unwrap_or_default())
    }

    async fn create_job(
        &self,
        file: &AudioFile,
        genre: &str,
        target_minutes: TargetMinutes,
    ) -> Result<JobAccepted, GatewayError> {
        let mut part = Part::bytes(file.data().to_vec()).file_name(file.file_name().to_string());
        if let Some(mime) = file.mime_type() {
            part = part
                .mime_str(mime)
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
        }
        // Content-Type 及 boundary 由 reqwest 生成
        let form = Form::new()
            .part("audio_file", part)
            .text("genre", genre.to_string())
            .text("target_minutes", target_minutes.to_string());

        tracing::debug!(
            url = %self.jobs_url(),
            file = %file.file_name(),
            size = file.len(),
            genre = %genre,
            target_minutes = target_minutes.get(),
            "Sending create job request"
        );

        self.send_json(self.client.post(self.jobs_url()).multipart(form))
            .await
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<JobSnapshot, GatewayError> {
        self.send_json(self.client.get(self.job_url(job_id))).await
    }

    fn audio_url(&self, job_id: &JobId) -> String {
        format!("{}/jobs/{}/audio", self.base_url, job_id)
    }
}
