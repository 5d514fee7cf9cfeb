use clap::Parser;

mod cli;
pub mod exit_codes;

use cli::args::{Cli, LogFormat};
use cli::commands::dispatch;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let code = dispatch(cli.command);
    std::process::exit(code);
}

/// Logs go to stderr; stdout is reserved for command output.
/// `VIGIL_LOG` wins over `RUST_LOG`; the default is `warn`.
fn init_tracing(format: LogFormat) {
    let filter = std::env::var("VIGIL_LOG")
        .ok()
        .and_then(|v| tracing_subscriber::EnvFilter::try_new(v).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Text => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
    if let Err(err) = result {
        eprintln!("warning: tracing already initialised: {err}");
    }
}
