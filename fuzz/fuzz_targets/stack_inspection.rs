#![no_main]

use libfuzzer_sys::fuzz_target;
use trust_gate::host::parse_backtrace_frames;
use trust_gate::{inspect_frames, normalize_sha256_hex, HookRules};

fuzz_target!(|data: &[u8]| {
    let rendered = String::from_utf8_lossy(data);
    let frames = parse_backtrace_frames(&rendered);
    let _ = inspect_frames(&frames, &HookRules::default());
    let _ = normalize_sha256_hex(&rendered);
});
