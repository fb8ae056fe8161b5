//! caseflow: uppercase a byte stream, with optional gzip on either side.
//!
//! Usage: caseflow [--in | - | --file=FILENAME] [--uncompress] [--compress] [--out]

use caseflow::cli::{self, Invocation};
use caseflow::config::{self, InputSource, OutputTarget};
use caseflow::errors::CaseflowError;
use caseflow::events::LoggingEventSink;
use caseflow::observability::init_tracing;
use caseflow::pipeline::execute;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return fail(&CaseflowError::io("cannot start runtime", e)),
    };
    let code = runtime.block_on(run());
    // A timed-out stdin read is still parked on a blocking thread.
    runtime.shutdown_background();
    code
}

async fn run() -> ExitCode {
    let invocation = config::resolve_base_path()
        .and_then(|base_path| cli::parse(std::env::args_os(), &base_path));

    let config = match invocation {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            eprintln!();
            print_help();
            return ExitCode::FAILURE;
        }
        Err(err) => return fail(&err),
    };

    match execute(&config, Arc::new(LoggingEventSink::default())).await {
        Ok(_) => {
            // stdout is reserved for data when --out is set
            if matches!(config.input(), InputSource::File(_))
                && matches!(config.output(), OutputTarget::File(_))
            {
                println!("Complete!");
            }
            ExitCode::SUCCESS
        }
        Err(err) => fail(&err),
    }
}

fn fail(err: &CaseflowError) -> ExitCode {
    eprintln!("{err}");
    if err.shows_help() {
        print_help();
    }
    ExitCode::FAILURE
}

fn print_help() {
    println!();
    println!("{}", cli::help_text());
}
