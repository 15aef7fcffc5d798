//! Jenkins completion callbacks.
//!
//! Jenkins calls back with a self-describing path
//! (`/{command}/{job}/{build}/{owner}/{channel}/{thread}`). The listener
//! answers `200` immediately; the [`CallbackCorrelator`] then waits a short
//! delay, fetches the job artifact and reports back into the chat thread that
//! requested the job.

mod callback_path;
mod callback_server;
mod correlator;

pub use callback_path::{parse_callback_path, CallbackPathError};
pub use callback_server::{
    build_callback_router, run_callback_server, CallbackServerConfig, DEFAULT_CALLBACK_BIND,
};
pub use correlator::{
    extract_branch_lines, CallbackCorrelator, CallbackOutcome, FAILURE_REACTION,
    JOB_SUCCESS_MARKER, SUCCESS_REACTION,
};
