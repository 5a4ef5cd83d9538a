//! `log` backend writing into the simulator's `Log.txt`.
//!
//! Records are formatted by `env_logger` and piped, one complete line at a time, into
//! `XPLMDebugString`.

use env_logger::{Builder, Logger, Target, WriteStyle};
use fbw_xplm::config::LogConfig;
use fbw_xplm::utilities::debug_string;
use fbw_xplm::{PluginConfig, XplmError, XplmResult};
use log::LevelFilter;
use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct HostLoggerConfig {
    /// Shown in front of every line, usually the plugin name.
    pub prefix: String,
    pub level: LevelFilter,
    pub include_module: bool,
}

impl HostLoggerConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            level: LevelFilter::Info,
            include_module: false,
        }
    }

    /// Applies the `[log]` section of the plugin config. Unknown levels keep `info`.
    pub fn with_log_config(mut self, config: &LogConfig) -> Self {
        self.level = config.level.parse().unwrap_or_else(|_| {
            debug_string(&format!("[{}] unknown log level {:?}, using info\n", self.prefix, config.level));
            LevelFilter::Info
        });
        self.include_module = config.show_module;
        self
    }

    /// `FBW_LOG` and `FBW_LOG_MODULE` only, for plugins without a config file.
    pub fn from_env(prefix: impl Into<String>) -> Self {
        let mut plugin = PluginConfig::default();
        plugin.apply_env(|key| std::env::var(key).ok());
        Self::new(prefix).with_log_config(&plugin.log)
    }
}

/// Line-buffered pipe into `XPLMDebugString`.
#[derive(Default)]
pub struct DebugStringWriter {
    pending: Vec<u8>,
}

impl DebugStringWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(bytes: &[u8]) {
        debug_string(&String::from_utf8_lossy(bytes));
    }
}

impl Write for DebugStringWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        if let Some(last_nl) = self.pending.iter().rposition(|&b| b == b'\n') {
            let rest = self.pending.split_off(last_nl + 1);
            Self::emit(&self.pending);
            self.pending = rest;
        }
        Ok(buf.len())
    }

    /// Sends a trailing partial line, terminated.
    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.pending.push(b'\n');
            Self::emit(&self.pending);
            self.pending.clear();
        }
        Ok(())
    }
}

impl Drop for DebugStringWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

pub struct HostLogger {
    config: HostLoggerConfig,
}

impl HostLogger {
    #[inline]
    pub fn new(config: HostLoggerConfig) -> Self {
        Self { config }
    }

    fn builder(&self) -> Builder {
        let mut builder = Builder::new();
        builder
            .filter_level(self.config.level)
            .write_style(WriteStyle::Never)
            .target(Target::Pipe(Box::new(DebugStringWriter::new())));

        let config = self.config.clone();
        builder.format(move |buf, record| {
            if config.include_module {
                writeln!(
                    buf,
                    "{}: [{:<5}] {:<25} {}",
                    config.prefix,
                    record.level(),
                    record.target(),
                    record.args()
                )
            } else {
                writeln!(buf, "{}: [{:<5}] {}", config.prefix, record.level(), record.args())
            }
        });
        builder
    }

    /// The logger without installing it.
    pub fn build(&self) -> Logger {
        self.builder().build()
    }

    /// Installs the logger for the process. Only the first call in a process succeeds.
    pub fn init(&self) -> XplmResult<()> {
        self.builder()
            .try_init()
            .map_err(|e| XplmError::Config(format!("logger init failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbw_xplm::test_host::TestHost;
    use log::{Level, Log, Record};

    fn log_with(logger: &Logger, level: Level, target: &str, msg: &str) {
        logger.log(&Record::builder().args(format_args!("{msg}")).level(level).target(target).build());
        logger.flush();
    }

    #[test]
    fn writer_forwards_complete_lines() {
        let host = TestHost::new();
        let mut w = DebugStringWriter::new();
        w.write_all(b"first line\nsecond ").unwrap();
        assert_eq!(host.debug_log(), "first line\n");
        w.write_all(b"half\nthird").unwrap();
        assert_eq!(host.debug_log(), "first line\nsecond half\n");
        w.flush().unwrap();
        assert_eq!(host.debug_log(), "first line\nsecond half\nthird\n");
        drop(w);
        assert_eq!(host.debug_log(), "first line\nsecond half\nthird\n");
    }

    #[test]
    fn records_reach_the_host_log() {
        let host = TestHost::new();
        let logger = HostLogger::new(HostLoggerConfig::new("TCAS")).build();
        log_with(&logger, Level::Warn, "fbw_xpmp2::aircraft", "no CSL model for B748");
        assert_eq!(host.debug_log(), "TCAS: [WARN ] no CSL model for B748\n");
    }

    #[test]
    fn module_column_and_level_filter() {
        let host = TestHost::new();
        let config = HostLoggerConfig::new("TCAS").with_log_config(&LogConfig {
            level: "debug".into(),
            show_module: true,
        });
        assert_eq!(config.level, LevelFilter::Debug);
        let logger = HostLogger::new(config).build();
        log_with(&logger, Level::Trace, "xpmp2", "int pref planes/clamp_all_to_ground");
        assert_eq!(host.debug_log(), "");
        log_with(&logger, Level::Debug, "xpmp2", "created aircraft 3C6444");
        assert_eq!(host.debug_log(), format!("TCAS: [DEBUG] {:<25} created aircraft 3C6444\n", "xpmp2"));
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let host = TestHost::new();
        let config = HostLoggerConfig::new("TCAS").with_log_config(&LogConfig {
            level: "loud".into(),
            show_module: false,
        });
        assert_eq!(config.level, LevelFilter::Info);
        assert!(host.debug_log().contains("unknown log level \"loud\""));
    }
}
