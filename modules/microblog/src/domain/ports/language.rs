/// Best-effort language guess for post bodies.
pub trait LanguageDetector: Send + Sync {
    /// A short language code, or `"UNKNOWN"` when the guess is unreliable.
    fn detect(&self, text: &str) -> String;
}

/// Detector used when no language service is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UndetectedLanguage;

impl LanguageDetector for UndetectedLanguage {
    fn detect(&self, _text: &str) -> String {
        "UNKNOWN".to_string()
    }
}

/// Stored language tag: empty when the detector is unsure or the code is
/// longer than five characters.
pub fn normalize_language(code: &str) -> String {
    let code = code.trim();
    if code.eq_ignore_ascii_case("unknown") || code.chars().count() > 5 {
        String::new()
    } else {
        code.to_string()
    }
}
