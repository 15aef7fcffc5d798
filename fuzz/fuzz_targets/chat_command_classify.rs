#![no_main]

use hubbot_commands::{tokenize, CommandClassifier, Dispatcher};
use hubbot_core::{ChatEvent, EnvironmentRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    for token in tokenize(&raw) {
        assert!(!token.is_empty());
    }

    let event = ChatEvent::new("U1", "C1", "1.1", raw.to_string());
    let classifier = CommandClassifier::with_default_terms("UBOT");
    if let Some(command) = classifier.classify(&event) {
        let dispatcher = Dispatcher::new(EnvironmentRegistry::with_defaults("dev01"));
        let result = dispatcher.dispatch(&command);
        if let Some(text) = result.response_text.as_deref() {
            assert!(text.starts_with("*[dev01]* "));
        }
        if result.job.is_some() {
            assert_eq!(command.target_environment(), "dev01");
        }
    }
});
