use chrono::Local;
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Directory the daily log files are written to.
pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("midiloop")
        .join("logs"))
}

/// Logs everything at debug level to a dated file, and info and above to the
/// terminal when `verbose` is set.
pub fn init_logger(verbose: bool) -> Result<(), Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let file_name = format!("midiloop-{}.log", Local::now().format("%Y-%m-%d"));
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(file_name))?;

    INIT.call_once(|| {
        let config = Config::default();
        let mut loggers: Vec<Box<dyn SharedLogger>> =
            vec![WriteLogger::new(LevelFilter::Debug, config.clone(), log_file)];
        if verbose {
            loggers.push(TermLogger::new(
                LevelFilter::Info,
                config,
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ));
        }

        if CombinedLogger::init(loggers).is_ok() {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        log::info!("Logging started at {}", Local::now().to_rfc3339());
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}
