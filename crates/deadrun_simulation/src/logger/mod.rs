//! Глобальный logger симуляции
//!
//! Хост устанавливает свой sink (engine adapter печатает в свою консоль,
//! тесты и headless бинарь используют ConsoleSink). Симуляция пишет через
//! свободные функции log/log_info/log_warning/log_error.

use once_cell::sync::Lazy;
use std::sync::Mutex;

// Потокобезопасный глобальный sink
static SINK: Lazy<Mutex<Option<Box<dyn LogSink>>>> = Lazy::new(|| Mutex::new(None));

// Минимальный уровень, который доходит до sink
static LEVEL: Lazy<Mutex<LogLevel>> = Lazy::new(|| Mutex::new(LogLevel::Debug));

/// Уровень сообщения
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Приёмник лог-сообщений (реализуется хостом)
pub trait LogSink: Send + Sync {
    fn print(&self, level: LogLevel, message: &str);
}

pub fn set_sink(sink: Box<dyn LogSink>) {
    *SINK.lock().unwrap() = Some(sink);
}

pub fn set_sink_if_needed(sink: Box<dyn LogSink>) {
    let mut current = SINK.lock().unwrap();
    if current.is_none() {
        *current = Some(sink);
    }
}

pub fn set_level(level: LogLevel) {
    *LEVEL.lock().unwrap() = level;
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

pub fn log_with_level(level: LogLevel, message: &str) {
    if level < *LEVEL.lock().unwrap() {
        return;
    }
    // Timestamp добавляем здесь, а не в sink, чтобы все sink'и были единообразны
    if let Some(sink) = SINK.lock().unwrap().as_ref() {
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        sink.print(level, &format!("[{}] {}", timestamp, message));
    }
}

/// Sink по умолчанию: stdout
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn print(&self, level: LogLevel, message: &str) {
        println!("[{}] {}", level.as_str(), message);
    }
}

pub fn init_logger() {
    set_sink_if_needed(Box::new(ConsoleSink));
}
