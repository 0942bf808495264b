use std::io;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout only carries the rendered prompt or parse result.
pub fn setup_logging(verbose_level: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let filter_str = match verbose_level {
            0 => "warn",
            1 => "info,tool_protocol=debug",
            _ => "debug,tool_protocol=trace",
        };
        EnvFilter::new(filter_str)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();
}
