use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use factoryctl::app;
use factoryctl::cli::{usage_exit_code, Cli};
use factoryctl::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("warning: logging disabled: {e}");
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = usage_exit_code(&e);
            let _ = e.print();
            return exit_code(code);
        }
    };

    let config_path = cli.config;
    let outcome = match cli.command.into_request() {
        Ok(request) => {
            app::run(
                request,
                || Config::load(config_path.as_deref()),
                &mut io::stdout(),
                &mut io::stderr(),
            )
            .await
        }
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_code(app::report(&err, &mut io::stderr())),
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Logs go to stderr; stdout carries only the JSON result.
fn init_tracing() -> anyhow::Result<()> {
    let directive = std::env::var("FACTORY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".into());
    let filter = EnvFilter::try_new(directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
