use std::cell::RefCell;
use std::env;
use std::fmt::Arguments;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TraceLevel {
    Off,
    Basic,
    Full,
}

const COLOR_WARNING: &str = "33";
const COLOR_ERROR: &str = "91";
const COLOR_CRITICAL: &str = "31";
const COLOR_TRACE: &str = "34";

static TRACE_LEVEL: OnceLock<TraceLevel> = OnceLock::new();

thread_local! {
    static SCOPE: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn parse_trace_level(value: &str) -> TraceLevel {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "basic" => TraceLevel::Basic,
        "full" => TraceLevel::Full,
        _ => TraceLevel::Off,
    }
}

fn trace_level() -> TraceLevel {
    *TRACE_LEVEL.get_or_init(|| {
        env::var("CNTKREAD_TRACE")
            .ok()
            .as_deref()
            .map(parse_trace_level)
            .unwrap_or(TraceLevel::Off)
    })
}

fn trace_full_enabled() -> bool {
    matches!(trace_level(), TraceLevel::Full)
}

fn trace_basic_enabled() -> bool {
    matches!(trace_level(), TraceLevel::Full | TraceLevel::Basic)
}

fn timestamp_hms() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        % 86_400;
    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Label prefixed to every message on this thread until the guard drops.
///
/// The loader scopes each model by its path so interleaved loads stay
/// readable. Scopes nest; dropping a guard restores the outer label.
#[must_use]
pub struct ScopeGuard {
    previous: Option<String>,
}

pub fn scope(label: impl Into<String>) -> ScopeGuard {
    let label = label.into();
    let previous = SCOPE.with(|scope| scope.borrow_mut().replace(label));
    ScopeGuard { previous }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        SCOPE.with(|scope| *scope.borrow_mut() = previous);
    }
}

fn current_scope() -> Option<String> {
    SCOPE.with(|scope| scope.borrow().clone())
}

fn format_line(ts: &str, kind: &str, color: &str, args: Arguments) -> String {
    match current_scope() {
        Some(label) => format!("{ts} [\u{001b}[{color}m{kind}\u{001b}[0m] -- {label}: {args}"),
        None => format!("{ts} [\u{001b}[{color}m{kind}\u{001b}[0m] -- {args}"),
    }
}

fn emit(kind: &str, color: &str, args: Arguments) {
    eprintln!("{}", format_line(&timestamp_hms(), kind, color, args));
}

/// Emit a warning message when `CNTKREAD_TRACE=full`.
pub fn emit_warning(args: Arguments) {
    if trace_full_enabled() {
        emit("WARNING", COLOR_WARNING, args);
    }
}

/// Emit an error message when tracing is on.
pub fn emit_error(args: Arguments) {
    if trace_basic_enabled() {
        emit("ERROR", COLOR_ERROR, args);
    }
}

/// Emit a critical message unconditionally.
pub fn emit_critical(args: Arguments) {
    emit("CRITICAL", COLOR_CRITICAL, args);
}

/// Emit a trace message when tracing is on.
pub fn emit_trace(args: Arguments) {
    if trace_basic_enabled() {
        emit("TRACE", COLOR_TRACE, args);
    }
}

/// Emit a warning message via the logging subsystem.
#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {
        $crate::logging::emit_warning(format_args!($($arg)*))
    };
}

/// Emit an error message via the logging subsystem.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logging::emit_error(format_args!($($arg)*))
    };
}

/// Emit a critical message via the logging subsystem.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {
        $crate::logging::emit_critical(format_args!($($arg)*))
    };
}

/// Emit a trace message via the logging subsystem.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::logging::emit_trace(format_args!($($arg)*))
    };
}
