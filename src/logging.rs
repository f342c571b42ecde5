use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target, WriteStyle};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] {}: {}",
            buf.timestamp(),
            record.level(),
            record.args()
        )
    });
    builder
}

/// Send log records to `log_file`, appending. Stdout is left to the report.
pub fn init_logging(log_file: &Path) -> Result<()> {
    let file = open_log_file(log_file)?;
    builder()
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .try_init()
        .context("logger already initialized")?;
    Ok(())
}

/// Fallback when the log file is unusable.
pub fn init_stderr_logging() -> Result<()> {
    builder()
        .target(Target::Stderr)
        .try_init()
        .context("logger already initialized")?;
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_and_directory_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/imap-monitor.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn second_logger_init_is_reported() {
        // the first call may race other tests; only the second outcome is certain
        let _first = init_stderr_logging();
        let err = init_stderr_logging().unwrap_err();
        assert!(err.to_string().contains("logger already initialized"));
    }

    #[test]
    fn directory_as_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_log_file(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("cannot open log file"));
    }
}
