use anyhow::{Context, Result};
use clap::Parser;
use wsfmt::cli::{build_runtime, configure_thread_pool, log_level, Cli};
use wsfmt::driver::exit_code::{SUCCESS, UNHANDLED_EXCEPTION};
use wsfmt::driver::{cancel_on_interrupt, RunDriver, RunOptions};
use wsfmt::observability::{init_logging, install_panic_hook};
use wsfmt::CancellationToken;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            UNHANDLED_EXCEPTION
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    // clap's own exit code for usage errors collides with the check-failed code
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                UNHANDLED_EXCEPTION
            } else {
                SUCCESS
            };
            e.print().context("Failed to print usage")?;
            return Ok(code);
        }
    };

    install_panic_hook();
    init_logging(log_level(cli.verbosity.as_deref()));

    // `run.jobs` from the config file is applied per run by the driver
    let jobs = cli.jobs.unwrap_or(0);
    configure_thread_pool(jobs);

    let base_dir = std::env::current_dir().context("Failed to read the current directory")?;
    let options = RunOptions::from_cli(&cli, base_dir);
    let runtime = build_runtime(jobs).context("Failed to start the async runtime")?;

    let outcome = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = cancel_on_interrupt(cancel.clone());
        let outcome = RunDriver::new().run(&options, &cancel).await;
        interrupt.abort();
        outcome
    });
    Ok(outcome.exit_code)
}
