#![no_main]
use libfuzzer_sys::fuzz_target;
use tadpole::modules::path;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Ok(normalized) = path::normalize(raw) {
            // Normalizing is idempotent and never yields an escaping path
            assert_eq!(path::normalize(&normalized).ok().as_deref(), Some(normalized.as_str()));
            assert!(!normalized.split('/').any(|s| s == ".." || s.is_empty()));
            assert!(path::is_within(".", &normalized));
        }
    }
});
