//! Structured crash report printed when analysis panics.

use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str =
    "════════════════════════════════════════════════════════════════════════════════";

/// Replace the default panic output with a report naming the active stage.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", crash_report(info, current_span_name()));
    }));
}

fn current_span_name() -> Option<&'static str> {
    Span::current().metadata().map(|m| m.name())
}

fn crash_report(info: &PanicHookInfo<'_>, span: Option<&str>) -> String {
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        format!("DEFECTSCOPE CRASH REPORT  v{VERSION}  ({})", std::env::consts::OS),
        format!("Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Panic: {}", truncate(&panic_message(info), 200)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    lines.push(format!("Stage: {}", span.unwrap_or("(outside analysis)")));
    if std::env::var_os("RUST_BACKTRACE").is_some() {
        lines.push(std::backtrace::Backtrace::capture().to_string());
    } else {
        lines.push("Run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
