//! voxsum - 语音摘要任务客户端
//!
//! 上传音频并跟踪后端摘要任务直到完成或失败：
//! - Domain: job/, submission/
//! - Application: ports, polling, controller
//! - Infrastructure: adapters (HTTP / scripted gateway), events

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use voxsum::application::{ControllerConfig, JobController, Phase, ViewState};
use voxsum::config::{load_config_from_path, print_config, LogConfig};
use voxsum::domain::job::JobId;
use voxsum::domain::submission::{AudioFile, TargetMinutes};
use voxsum::infrastructure::adapters::{HttpJobGateway, HttpJobGatewayConfig};
use voxsum::infrastructure::events::{EventPublisher, JobEvent};

#[derive(Parser)]
#[command(name = "voxsum", version, about = "Submit an audio file for summarisation and track the job")]
struct Cli {
    /// Audio file to summarise
    #[arg(required_unless_present = "list_genres")]
    file: Option<PathBuf>,

    /// Genre of the summary (must be offered by the backend)
    #[arg(short, long)]
    genre: Option<String>,

    /// Target summary length in minutes
    #[arg(short, long)]
    minutes: Option<u32>,

    /// Configuration file (defaults to ./voxsum.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Download the finished audio to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print lifecycle events as JSON lines
    #[arg(long)]
    json: bool,

    /// List the genres offered by the backend and exit
    #[arg(long)]
    list_genres: bool,
}

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},voxsum={}", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn render(event: &JobEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "Failed to serialise event"),
        }
        return;
    }
    match event {
        JobEvent::Submitting {
            file_name,
            genre,
            target_minutes,
        } => println!(
            "Uploading {} (genre: {}, target: {} min)...",
            file_name, genre, target_minutes
        ),
        JobEvent::Accepted { job_id } => println!("Job {} accepted. Processing started.", job_id),
        JobEvent::StatusUpdated { status_text, .. } => println!("{}", status_text),
        JobEvent::Completed { audio_url, .. } => println!("Done. Audio: {}", audio_url),
        JobEvent::Failed { error, .. } => eprintln!("Error: {}", error),
        JobEvent::GenresUnavailable { error } => eprintln!("Warning: {}", error),
        JobEvent::GenresLoaded { .. } | JobEvent::Terminated => {}
    }
}

/// 输出已缓冲的事件，遇到结束事件时返回 true
fn drain_pending(events: &mut Receiver<JobEvent>, json: bool) -> bool {
    while let Ok(event) = events.try_recv() {
        render(&event, json);
        if event.is_final() {
            return true;
        }
    }
    false
}

/// 提交并渲染事件直到跟踪结束
async fn track(
    controller: &JobController,
    events: &mut Receiver<JobEvent>,
    json: bool,
) -> Result<ViewState> {
    let submitted = controller.submit().await;
    // 轮询周期很短时结束事件可能已在缓冲中
    let finished = drain_pending(events, json);
    submitted?;
    if finished {
        return Ok(controller.view());
    }

    loop {
        match events.recv().await {
            Ok(event) => {
                render(&event, json);
                if event.is_final() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped = skipped, "Event receiver lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    Ok(controller.view())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);
    print_config(&config);

    let gateway = Arc::new(HttpJobGateway::new(
        HttpJobGatewayConfig::new(config.api.base_url.clone())
            .with_timeout(config.api.timeout_secs),
    )?);
    if !gateway.health_check().await {
        tracing::warn!(base_url = %gateway.base_url(), "Backend health check failed");
    }

    let controller_config = ControllerConfig {
        poll_interval: config.polling.interval(),
        default_genre: config.defaults.genre.clone(),
        default_target_minutes: TargetMinutes::new(config.defaults.target_minutes)?,
    };
    let events = EventPublisher::new().arc();
    let controller = JobController::new(gateway.clone(), controller_config, events);
    let mut receiver = controller.subscribe();

    controller.init().await;

    if cli.list_genres {
        let view = controller.view();
        if let Some(error) = view.error_message {
            bail!(error);
        }
        for genre in view.genres {
            println!("{}", genre);
        }
        return Ok(());
    }

    if let Some(genre) = cli.genre.as_deref() {
        controller.set_genre(genre)?;
    }
    if let Some(minutes) = cli.minutes {
        controller.set_target_minutes(minutes)?;
    }
    if let Some(path) = cli.file.as_deref() {
        let file = AudioFile::from_path(path).await?;
        controller.select_file(Some(file))?;
    }
    // 丢弃加载阶段的事件
    while receiver.try_recv().is_ok() {}

    let view = tokio::select! {
        view = track(&controller, &mut receiver, cli.json) => view?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
            controller.teardown();
            return Ok(());
        }
    };

    match view.phase {
        Phase::Done => {
            if let (Some(output), Some(job_id)) = (cli.output.as_deref(), view.job_id.as_deref()) {
                let bytes = gateway
                    .download_audio(&JobId::new(job_id), output)
                    .await
                    .with_context(|| format!("Failed to download audio to {}", output.display()))?;
                println!("Saved {} bytes to {}", bytes, output.display());
            }
            Ok(())
        }
        Phase::Failed => bail!(view
            .error_message
            .unwrap_or_else(|| "The job failed.".to_string())),
        other => bail!("Tracking ended in unexpected phase: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_stops_at_final_event() {
        let events = EventPublisher::new();
        let mut receiver = events.subscribe();
        events.publish_submitting("talk.wav", "general", 3);
        events.publish_accepted("abc123");
        events.publish_status("abc123", "completed", "Current status: completed");
        events.publish_completed("abc123", "http://api.test/api/v1/jobs/abc123/audio");
        events.publish_terminated();

        assert!(drain_pending(&mut receiver, true));
        // 结束事件之后的事件留在通道中
        assert_eq!(receiver.try_recv().unwrap(), JobEvent::Terminated);
    }

    #[test]
    fn test_drain_without_final_event() {
        let events = EventPublisher::new();
        let mut receiver = events.subscribe();
        events.publish_accepted("abc123");
        events.publish_status("abc123", "running", "Current status: running");

        assert!(!drain_pending(&mut receiver, false));
        assert!(receiver.try_recv().is_err());
    }
}
