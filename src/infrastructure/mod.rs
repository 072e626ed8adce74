//! Infrastructure Layer - 基础设施层
//!
//! 提供端口的具体实现与事件发布

pub mod adapters;
pub mod events;

pub use adapters::{GatewayCall, HttpJobGateway, HttpJobGatewayConfig, ScriptedJobGateway};
pub use events::{EventPublisher, JobEvent};
