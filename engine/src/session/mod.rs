//! Interview sessions
//!
//! - `policy`: difficulty adaptation, termination and next-question selection
//! - `controller`: the per-session state machine
//! - `store`: the table of live sessions shared by the drivers

pub mod controller;
pub mod policy;
pub mod store;

pub use controller::{
    static_welcome, Collaborators, InterviewSession, QuestionView, SessionId, SessionSettings,
    SessionStatus, StartOutcome, SubmitOutcome,
};
pub use policy::InterviewPlan;
pub use store::{SessionGuard, SessionStore};
