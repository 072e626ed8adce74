//! Job Controller

mod job_controller;
mod state;

pub use job_controller::{
    ControllerConfig, JobController, ACCEPTED_TEXT, GENRES_UNAVAILABLE_MESSAGE, JOB_FAILED_MESSAGE,
    SUBMITTING_TEXT,
};
pub use state::{Phase, ViewState};
