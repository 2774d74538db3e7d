#![no_main]
use libfuzzer_sys::fuzz_target;
use tadpole::{BindMode, MemoryBackend, Namespace};

fuzz_target!(|data: &[u8]| {
    if let Ok(name) = std::str::from_utf8(data) {
        let ns = Namespace::new();
        let upper = MemoryBackend::new()
            .with_file("index.html", "upper")
            .and_then(|b| b.with_file("docs/a.md", "a"));
        let lower = MemoryBackend::new().with_file("docs/b.md", "b");
        if let (Ok(upper), Ok(lower)) = (upper, lower) {
            let _ = ns.bind(".", lower, "lower", BindMode::After);
            let _ = ns.bind(".", upper, "upper", BindMode::Before);
            let _ = ns.bind("docs/extra", MemoryBackend::new(), "extra", BindMode::After);

            // Lookups of arbitrary names must fail cleanly, never panic,
            // and listings must agree with stat.
            let _ = ns.open(name);
            if let Ok(entries) = ns.read_dir(name) {
                for entry in entries {
                    let child = format!("{}/{}", name, entry.name);
                    assert!(ns.exists(&child).unwrap_or(false) || entry.is_dir());
                }
            }
            let _ = ns.stat(name);
        }
    }
});
