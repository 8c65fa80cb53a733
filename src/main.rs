#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use jumprun::cli::{Cli, CommandRegistry, EXIT_FATAL, init_logging, render, write_output};
use jumprun::remote::config::resolve_max_parallel;
use jumprun::remote::{Dispatcher, RemoteError, SshConnector, resolve_remote_args};
use tokio_util::sync::CancellationToken;
use tracing::{error, info_span, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(kind = %e.kind(), error = %e, "fatal");
            eprintln!("jumprun: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> Result<u8, RemoteError> {
    let registry = CommandRegistry::builtin();

    if cli.list_commands {
        print!("{}", registry.describe());
        return Ok(0);
    }

    let Some(name) = cli.command.as_deref() else {
        return Err(RemoteError::Fatal("no command given".to_string()));
    };
    let task = registry.create(name, &cli.args)?;
    let specs = resolve_remote_args(&cli.remote)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling batch");
            on_interrupt.cancel();
        }
    });

    let dispatcher = Dispatcher::new(SshConnector::new())
        .with_span(info_span!("jumprun"))
        .with_cancellation(cancel)
        .with_max_parallel(resolve_max_parallel(cli.max_parallel));

    let report = dispatcher.dispatch(&specs, task.as_ref()).await;

    let rendered = render(&report, cli.format)
        .map_err(|e| RemoteError::Fatal(format!("failed to render report: {e}")))?;
    write_output(&rendered, cli.output.as_deref())
        .map_err(|e| RemoteError::Fatal(format!("failed to write report: {e}")))?;

    Ok(report.exit_code())
}
