#![no_main]

use citadel_sanitizer::sanitize_css;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(style) = std::str::from_utf8(data) {
        // Limit input size to prevent excessive resource usage
        if style.len() > 10_000 {
            return;
        }

        let clean = sanitize_css(style);
        let lowered = clean.to_ascii_lowercase();
        assert!(!lowered.contains("expression("), "expression() survived: {}", clean);
        assert!(!lowered.contains("javascript:"), "javascript url survived: {}", clean);
    }
});
