//! Job Gateway Adapters
//!
//! - HttpJobGateway: 真实后端
//! - ScriptedJobGateway: 按脚本应答，用于测试和离线演示

mod http_job_gateway;
mod scripted_job_gateway;

pub use http_job_gateway::{HttpJobGateway, HttpJobGatewayConfig};
pub use scripted_job_gateway::{GatewayCall, ScriptedJobGateway};
