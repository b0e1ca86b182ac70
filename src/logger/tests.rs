//! Tests for the logger module

use std::io::Write;
use std::path::PathBuf;

use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::*;
use crate::logger::error::LoggerError;
use crate::logger::writer::LogFileWriter;

fn console_only() -> LoggerConfig {
    LoggerConfig {
        console: ConsoleConfig {
            enabled: true,
            colored: false,
        },
        file: FileConfig {
            enabled: false,
            path: PathBuf::from("test.log"),
            append: true,
            format: LogFormat::Full,
        },
        level: "info".to_string(),
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = LoggerConfig::default();
        assert!(config.console.enabled);
        assert!(config.console.colored);
        assert!(!config.file.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.file.format, LogFormat::Json);
    }

    #[test]
    fn test_config_validation() {
        let mut config = console_only();
        assert!(config.validate().is_ok());

        config.console.enabled = false;
        config.file.enabled = false;
        assert!(matches!(config.validate(), Err(LoggerError::Config { .. })));
    }

    #[test]
    fn test_level_accepts_directives() {
        let mut config = console_only();
        config.level = "warn,redis_autoconfigure=debug".to_string();
        assert!(config.validate().is_ok());

        config.level = "info,redis_autoconfigure=verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = console_only();
        config.file.enabled = true;
        config.file.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.to_string().contains("full, compact, json"));
        assert_eq!(LogFormat::default(), LogFormat::Full);
    }

    #[test]
    fn test_console_shortcut() {
        let config = LoggerConfig::console("debug");
        assert_eq!(config.level, "debug");
        assert!(config.console.enabled);
        assert!(!config.file.enabled);
    }
}

mod writer_tests {
    use super::*;

    #[test]
    fn test_writer_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/app.log");
        let config = FileConfig {
            enabled: true,
            path: path.clone(),
            append: true,
            format: LogFormat::Json,
        };

        let writer = LogFileWriter::new(&config).unwrap();
        writer.make_writer().write_all(b"first line\n").unwrap();
        writer.make_writer().write_all(b"second line\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first line\nsecond line\n");
        assert!(!writer.is_in_fallback_mode());
    }

    #[test]
    fn test_truncate_when_not_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "old content\n").unwrap();

        let config = FileConfig {
            enabled: true,
            path: path.clone(),
            append: false,
            format: LogFormat::Full,
        };
        let writer = LogFileWriter::new(&config).unwrap();
        writer.make_writer().write_all(b"new\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }
}
