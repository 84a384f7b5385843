// Entrypoint for the CLI application.
// - Keeps `main` small: load config, build the transport, hand off to
//   the orchestrator, and map its outcome to the process exit code.
// - The transport is constructed here and owned for the whole process,
//   so there is exactly one HTTP client per run.

use std::env;
use std::process::ExitCode;

use spbackup_cli::api;
use spbackup_cli::config::{self, Config};
use spbackup_cli::poll::PollPolicy;
use spbackup_cli::run;

fn main() -> ExitCode {
    let program = env::args().next().unwrap_or_else(|| "spbackup".into());

    let config = match Config::load(env::args()) {
        Ok(config) => config,
        Err(_) => {
            config::print_usage(&program);
            return ExitCode::from(1);
        }
    };

    let client = match api::build_client(&config.server_url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    ExitCode::from(run::run(&config, &client, &PollPolicy::default()))
}
