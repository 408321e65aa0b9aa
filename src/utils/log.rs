// utils/log.rs

use std::{
    collections::VecDeque,
    fs::{
        self,
        File,
    },
    io::{
        self,
        BufRead,
        BufReader,
        BufWriter,
        Write,
    },
    path::Path,
    str::FromStr,
    sync::OnceLock,
};

use tempfile::NamedTempFile;
use tracing::{
    debug,
    error,
    level_filters::LevelFilter,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt::time,
    prelude::*,
};

use crate::config::CONFIG;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// # Trims a log file until it's under a maximum size
///
/// Trimming means deleting lines from the top of the file
///
/// # Arguments
/// * `path`        - The path to the log file to be trimmed
/// * `max_size`    - The maximum size of the log file, in bytes
///
/// # Returns
/// Bytes trimmed
///
/// # Errors
/// - Log file does not exist (`NotFound` should be handled when called)
/// - Other I/O errors
pub fn trim_log<P: AsRef<Path>>(path: P, max_size: u64) -> io::Result<u64> {
    let path = path.as_ref();
    let size = fs::metadata(path)?.len();

    if size <= max_size {
        return Ok(0);
    }

    let reader = BufReader::new(File::open(path)?);

    let mut lines = VecDeque::new();
    let mut total_size = 0;

    for line in reader.lines() {
        let line = line?;
        let line_size = (line.len() + 1) as u64; // account for \n

        total_size += line_size;
        lines.push_back((line, line_size));

        while total_size > max_size {
            if let Some((_, removed_size)) = lines.pop_front() {
                total_size -= removed_size;
            }
        }
    }

    // Keep the temp file next to the log so persisting is a rename on the same filesystem
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut temp_file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(&mut temp_file);
        for (line, _) in &lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
    }

    temp_file.persist(path)?;
    Ok(size - total_size)
}

fn filter() -> EnvFilter {
    let level = LevelFilter::from_str(&CONFIG.log_level).unwrap_or(LevelFilter::DEBUG);
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("LOG_LEVEL")
        .from_env_lossy();

    // Silence some loud crates
    for directive in ["hyper=warn", "hyper_util=warn", "tower_http=warn"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    filter
}

pub fn log() {
    let path = Path::new(&CONFIG.log_file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file = path.file_name().unwrap_or("qtupload.log".as_ref());
    let file_appender = rolling::never(dir, file);

    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    if CONFIG.log_to_console {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_level(true)
            .with_target(true)
            .with_line_number(true)
            .with_timer(time::uptime())
            .with_writer(file_writer.and(io::stdout))
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_level(true)
            .with_target(true)
            .with_line_number(true)
            .with_timer(time::uptime())
            .with_writer(file_writer)
            .compact()
            .init();
    }

    if LOG_GUARD.set(guard).is_err() {
        eprintln!("The log() function was called more than once.");
        eprintln!("Please report this as a bug.");
    }
}

/// # Initialize logging
///
/// This function wraps all the logging setup, including trimming
pub fn init() {
    // Trim before the appender opens the file, otherwise it keeps writing to the replaced inode
    let trimmed = trim_log(&CONFIG.log_file, CONFIG.log_max_size);
    log();
    match trimmed {
        | Ok(b) => debug!("Trimmed {b} bytes from log file"),
        | Err(e) if e.kind() == io::ErrorKind::NotFound => {},
        | Err(e) => error!("Failed to trim bytes from log file: {e}"),
    }
}
