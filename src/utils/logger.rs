//! 日志模块：env_logger 控制台彩色输出 + 文件镜像 + 按大小轮转
use env_logger::fmt::Formatter;
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter, Record};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

const LOG_DIR: &str = "LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_LEVEL: &str = "LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "INFO";
const LOG_FILE_NAME: &str = "cfx-tx-gas.log";
const LOG_MAX_SIZE_MB: u64 = 10;
const LOG_MAX_ROTATIONS: usize = 5;

static INIT_LOGGER: Once = Once::new();
static FILE_WRITER: Mutex<Option<File>> = Mutex::new(None);

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.to_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARN" => Some(LevelFilter::Warn),
        "ERROR" => Some(LevelFilter::Error),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[91m",
        Level::Warn => "\x1b[93m",
        Level::Info => "\x1b[92m",
        Level::Debug => "\x1b[96m",
        Level::Trace => "\x1b[95m",
    }
}

/// 初始化日志系统（全局只生效一次）
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let log_dir = std::env::var(LOG_DIR).unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        let raw_level = std::env::var(LOG_LEVEL).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        let level_filter = parse_level(&raw_level).unwrap_or_else(|| {
            eprintln!("⚠️ 无效日志级别「{}」，使用默认 INFO", raw_level);
            LevelFilter::Info
        });

        let log_path = Path::new(&log_dir).join(LOG_FILE_NAME);
        let file_enabled = match open_log_file(&log_dir, &log_path) {
            Ok(file) => {
                if let Ok(mut guard) = FILE_WRITER.lock() {
                    *guard = Some(file);
                }
                true
            }
            Err(e) => {
                eprintln!("❌ 日志文件不可用，仅输出到控制台: {}", e);
                false
            }
        };

        let mut builder = Builder::from_default_env();
        builder
            .filter(None, level_filter)
            .filter(Some("ethers_providers"), LevelFilter::Warn)
            .filter(Some("reqwest"), LevelFilter::Warn)
            .filter(Some("hyper"), LevelFilter::Warn)
            .write_style(WriteStyle::Auto)
            .format(move |f: &mut Formatter, record: &Record| {
                let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%3f");
                let module = record.module_path().unwrap_or("unknown");

                if file_enabled {
                    mirror_to_file(&format!(
                        "[{}] [{}] [{:>5}] - {}\n",
                        now,
                        module,
                        record.level(),
                        record.args()
                    ));
                }

                writeln!(
                    f,
                    "[{}] [{}{:>5}\x1b[0m] [{}] - {}",
                    now,
                    level_color(record.level()),
                    record.level(),
                    module,
                    record.args()
                )
            })
            .target(Target::Stdout);

        if let Err(e) = builder.try_init() {
            eprintln!("❌ 日志初始化失败: {}", e);
        } else {
            log::info!(
                "✅ 日志系统初始化完成 | 级别: {} | 日志文件: {}",
                level_filter,
                log_path.display()
            );
        }
    });
}

fn open_log_file(log_dir: &str, log_path: &Path) -> io::Result<File> {
    fs::create_dir_all(log_dir)?;
    if let Err(e) = rotate_logs(log_path) {
        eprintln!("⚠️ 日志轮转失败: {}", e);
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
}

fn mirror_to_file(line: &str) {
    // 文件写入失败不影响控制台输出
    if let Ok(mut guard) = FILE_WRITER.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

fn rotated_path(log_path: &Path, index: usize) -> PathBuf {
    let mut name = log_path.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// 超过阈值时 xxx.log → xxx.log.1 → … → xxx.log.N
fn rotate_logs(log_path: &Path) -> io::Result<()> {
    if !log_path.exists() {
        return Ok(());
    }
    let size_mb = fs::metadata(log_path)?.len() / (1024 * 1024);
    if size_mb < LOG_MAX_SIZE_MB {
        return Ok(());
    }

    for i in (1..LOG_MAX_ROTATIONS).rev() {
        let src = rotated_path(log_path, i);
        if src.exists() {
            fs::rename(&src, rotated_path(log_path, i + 1))?;
        }
    }
    fs::rename(log_path, rotated_path(log_path, 1))
}

#[macro_export]
macro_rules! log_trace { ($($arg:tt)*) => { log::trace!($($arg)*) }; }
#[macro_export]
macro_rules! log_debug { ($($arg:tt)*) => { log::debug!($($arg)*) }; }
#[macro_export]
macro_rules! log_info  { ($($arg:tt)*) => { log::info!($($arg)*) }; }
#[macro_export]
macro_rules! log_warn  { ($($arg:tt)*) => { log::warn!($($arg)*) }; }
#[macro_export]
macro_rules! log_error { ($($arg:tt)*) => { log::error!($($arg)*) }; }
