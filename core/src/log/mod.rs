//! Subscriber bootstrap for hosts embedding the metadata core.
//!
//! The library only emits `tracing` events, under the targets in [`EVENT_TARGETS`]. A host
//! without a subscriber of its own calls [`init`] once at startup; later calls hand back the
//! first [`LogHandle`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::Rotation;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Targets of every event the crate emits.
pub const EVENT_TARGETS: [&str; 2] = ["meta::comicinfo", "fs::archive"];

const DIRECTIVE_VARS: [&str; 2] = ["COMICINFO_LOG", "RUST_LOG"];
const LOG_SUFFIX: &str = "log";

static HANDLE: OnceLock<LogHandle> = OnceLock::new();

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum LogRolling {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRolling> for Rotation {
    fn from(rolling: LogRolling) -> Self {
        match rolling {
            LogRolling::Hourly => Rotation::HOURLY,
            LogRolling::Daily => Rotation::DAILY,
            LogRolling::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for rolled log files. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    /// Rolled files kept when logging starts; `0` keeps all of them.
    pub keep_files: usize,
    /// Level for the crate's own targets when no directive is given.
    pub level: LevelFilter,
    /// `EnvFilter` directive. Falls back to `COMICINFO_LOG`, then `RUST_LOG`.
    pub directive: Option<String>,
    pub rolling: LogRolling,
    /// Route `log` records from dependencies, up to `level`, into the subscriber too.
    pub capture_log: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: Some(default_log_directory()),
            file_prefix: "comicinfo".to_string(),
            keep_files: 7,
            level: if cfg!(debug_assertions) { LevelFilter::DEBUG } else { LevelFilter::INFO },
            directive: None,
            rolling: LogRolling::default(),
            capture_log: true,
        }
    }
}

impl LogConfig {
    pub fn console_only() -> Self {
        Self { directory: None, ..Self::default() }
    }

    pub fn with_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.directory = Some(path.into());
        self
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_directive<S: Into<String>>(mut self, directive: S) -> Self {
        self.directive = Some(directive.into());
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let directive = self
            .directive
            .clone()
            .or_else(directive_from_env)
            .unwrap_or_else(|| default_directive(self.level));
        EnvFilter::try_new(&directive)
            .with_context(|| format!("parsing log directive {directive:?}"))
    }
}

/// Keeps the file writer alive for the lifetime of the process.
#[derive(Debug)]
pub struct LogHandle {
    _guard: Option<WorkerGuard>,
    directory: Option<PathBuf>,
}

impl LogHandle {
    /// Where log files are written, if file logging is on.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }
}

/// Install the global subscriber. The first call wins; later configurations are ignored.
pub fn init(config: LogConfig) -> Result<&'static LogHandle> {
    if let Some(handle) = HANDLE.get() {
        return Ok(handle);
    }
    let handle = install(config)?;
    Ok(HANDLE.get_or_init(|| handle))
}

fn install(config: LogConfig) -> Result<LogHandle> {
    let filter = config.env_filter()?;

    if config.capture_log {
        // A `log` logger installed by the host stays in charge.
        let _ = tracing_log::LogTracer::builder().with_max_level(to_log_level(config.level)).init();
    }

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let (writer, guard) = file_writer(directory, &config)?;
            let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(LogHandle { _guard: guard, directory: config.directory })
}

fn file_writer(directory: &Path, config: &LogConfig) -> Result<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(directory)
        .with_context(|| format!("creating log directory {}", directory.display()))?;
    prune_rolled_files(directory, &config.file_prefix, config.keep_files)?;

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(config.rolling.into())
        .filename_prefix(&config.file_prefix)
        .filename_suffix(LOG_SUFFIX)
        .build(directory)
        .context("creating rolling log appender")?;
    Ok(tracing_appender::non_blocking(appender))
}

/// `warn` for everything, `level` for the crate's own targets.
fn default_directive(level: LevelFilter) -> String {
    let mut parts = vec!["warn".to_string()];
    parts.extend(EVENT_TARGETS.iter().map(|target| format!("{target}={level}")));
    parts.join(",")
}

fn directive_from_env() -> Option<String> {
    DIRECTIVE_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|directive| !directive.trim().is_empty())
}

fn to_log_level(level: LevelFilter) -> log::LevelFilter {
    match level {
        LevelFilter::OFF => log::LevelFilter::Off,
        LevelFilter::ERROR => log::LevelFilter::Error,
        LevelFilter::WARN => log::LevelFilter::Warn,
        LevelFilter::INFO => log::LevelFilter::Info,
        LevelFilter::DEBUG => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Delete all but the `keep` newest `<prefix>*.log` files. Returns how many were removed.
fn prune_rolled_files(directory: &Path, prefix: &str, keep: usize) -> Result<usize> {
    if keep == 0 {
        return Ok(0);
    }

    let mut rolled: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(directory)
        .with_context(|| format!("reading log directory {}", directory.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !is_rolled_file(&path, prefix) {
            continue;
        }
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            rolled.push((metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH), path));
        }
    }

    rolled.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(rolled.into_iter().skip(keep).filter(|(_, path)| fs::remove_file(path).is_ok()).count())
}

fn is_rolled_file(path: &Path, prefix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.starts_with(prefix) && path.extension().is_some_and(|ext| ext == LOG_SUFFIX)
}

fn default_log_directory() -> PathBuf {
    directories::ProjectDirs::from("org", "ComicInfo", "comicinfo-core")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("comicinfo-core-logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn prunes_all_but_newest_rolled_files() {
        let temp = tempfile::tempdir().expect("temp dir");
        let base = SystemTime::now() - Duration::from_secs(3600);
        let oldest_first = ["comicinfo.3.log", "comicinfo.2.log", "comicinfo.1.log"];
        for (age, name) in oldest_first.iter().enumerate() {
            let file = File::create(temp.path().join(name)).unwrap();
            file.set_modified(base + Duration::from_secs(age as u64 * 60)).unwrap();
        }
        fs::write(temp.path().join("comicinfo.txt"), b"x").unwrap();
        fs::write(temp.path().join("other.log"), b"x").unwrap();

        assert_eq!(prune_rolled_files(temp.path(), "comicinfo", 2).expect("prune"), 1);
        assert!(!temp.path().join("comicinfo.3.log").exists());
        assert!(temp.path().join("comicinfo.2.log").exists());
        assert!(temp.path().join("comicinfo.1.log").exists());
        assert!(temp.path().join("comicinfo.txt").exists());
        assert!(temp.path().join("other.log").exists());

        assert_eq!(prune_rolled_files(temp.path(), "comicinfo", 0).expect("keep all"), 0);
    }

    #[test]
    fn default_directive_covers_event_targets() {
        let directive = default_directive(LevelFilter::DEBUG);
        for target in EVENT_TARGETS {
            assert!(directive.contains(target), "{directive}");
        }
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn comicinfo_events_reach_the_log_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let directory = temp.path().join("logs");
        let mut config = LogConfig::default()
            .with_directory(directory.clone())
            .with_prefix("events")
            .with_directive("meta::comicinfo=debug");
        config.rolling = LogRolling::Never;

        let handle = init(config).expect("init");
        assert_eq!(handle.directory(), Some(directory.as_path()));
        assert!(std::ptr::eq(handle, init(LogConfig::console_only()).expect("second init")));

        crate::meta::decode(b"<ComicInfo><Series>Logged</Series></ComicInfo>").expect("decode");

        let mut contents = String::new();
        for _ in 0..100 {
            contents = fs::read_to_string(directory.join("events.log")).unwrap_or_default();
            if contents.contains("decoded ComicInfo") {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(contents.contains("decoded ComicInfo"), "{contents:?}");
        assert!(contents.contains("meta::comicinfo"));
    }
}
