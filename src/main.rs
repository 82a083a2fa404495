use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};

use rustygate::handler::standard_middleware;
use rustygate::http::headers::HttpHeaders;
use rustygate::{App, AppConfig, Environ, demo, observability};

/// Serves the demo endpoints for a single CGI-style request: variables come
/// from the environment, the body from stdin, the reply goes to stdout.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (config, load_err) = match &args.config {
        Some(path) => AppConfig::load_or_default(path),
        None => (AppConfig::default(), None),
    };
    observability::init_tracing(args.log_level.as_deref().unwrap_or(&config.log_level));
    if let (Some(path), Some(err)) = (&args.config, load_err) {
        warn!(path = %path, error = %err, "falling back to default config");
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "request failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = demo::router()?;
    let app = App::from_config(router, standard_middleware(config), config)?;

    let environ: Environ = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();
    let reply = app.handle(environ.with_input(std::io::stdin()))?;

    let mut out = std::io::stdout().lock();
    let headers: HttpHeaders = reply
        .headers
        .iter()
        .map(|(name, value)| (name, value.as_str()))
        .collect();
    write!(out, "Status: {}\r\n{}\r\n", reply.status, headers.stringify())?;
    for chunk in &reply.body {
        out.write_all(chunk)?;
    }
    out.flush()?;
    Ok(())
}
