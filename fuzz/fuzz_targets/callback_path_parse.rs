#![no_main]

use hubbot_callback::parse_callback_path;
use hubbot_core::{CallbackCommand, JobKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(Some(callback)) = parse_callback_path(&raw) {
        if callback.command == CallbackCommand::JobComplete {
            assert!(!callback.job_name.is_empty());
            assert!(!callback.build_number.is_empty());
            assert!(!callback.owner_user_id.is_empty());
            assert!(!callback.channel_id.is_empty());
        }
        let path = callback.artifact_location().path();
        match callback.kind() {
            JobKind::ImageJob => assert!(path.starts_with("/userContent/")),
            JobKind::LogJob | JobKind::StatusJob => assert!(path.ends_with("/consoleText")),
        }
        assert!(callback.thread_ts.as_deref() != Some(""));
    }
});
