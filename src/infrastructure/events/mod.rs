//! Lifecycle Events

mod publisher;

pub use publisher::{EventPublisher, JobEvent};
