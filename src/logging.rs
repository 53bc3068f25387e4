//! Tracing setup for the organizer binary.

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;

/// Log to `<home>/organizer.log`; with `verbose`, mirror to stderr as well.
/// `RUST_LOG` wins over the configured filter when set.
pub fn init_logging(config: &Config) -> io::Result<()> {
    fs::create_dir_all(&config.home)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let console_layer = config.verbose.then(|| {
        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_filter(console_filter)
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    Ok(())
}
