//! Voxsum - 音频摘要任务客户端
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Job Context: 任务标识、状态与快照
//! - Submission Context: 提交表单、题材目录与本地校验
//!
//! 应用层 (application/):
//! - Ports: 端口定义（JobGatewayPort）
//! - Polling: 可取消的周期轮询
//! - Controller: 任务生命周期状态机
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP 网关、脚本化网关
//! - Events: 生命周期事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{ControllerConfig, ControllerError, JobController, Phase, ViewState};
pub use config::{load_config_from_path, AppConfig};
