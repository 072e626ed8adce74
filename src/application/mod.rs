//! Application Layer - 应用层
//!
//! 包含:
//! - Ports: 出站端口定义
//! - Polling: 周期轮询调度
//! - Controller: 任务生命周期控制器

pub mod controller;
pub mod error;
pub mod polling;
pub mod ports;

pub use controller::{
    ControllerConfig, JobController, Phase, ViewState, ACCEPTED_TEXT, GENRES_UNAVAILABLE_MESSAGE,
    JOB_FAILED_MESSAGE, SUBMITTING_TEXT,
};
pub use error::{user_message, ControllerError, FALLBACK_ERROR_MESSAGE};
pub use polling::PollHandle;
pub use ports::{ErrorBody, GatewayError, JobGatewayPort};
