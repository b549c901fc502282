use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use sokolnet_builder::cli::Cli;
use sokolnet_builder::config::HomeConfig;
use sokolnet_builder::log_collector::level_for_verbosity;
use sokolnet_builder::{Dispatcher, LogCollector};

#[tokio::main]
async fn main() {
    let code = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn real_main() -> anyhow::Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            return Ok(code);
        }
    };

    // =========================================================================
    // LOGGING INITIALIZATION - MUST BE FIRST
    // =========================================================================
    let log_collector = LogCollector::new(level_for_verbosity(cli.verbose));
    if let Err(e) = log_collector.install() {
        eprintln!("warning: failed to install logger: {}", e);
    }
    log::debug!("sokolnet-builder {}", sokolnet_builder::VERSION);

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let home_config = match cli.config_dir {
        Some(ref dir) => HomeConfig::at(dir.clone()),
        None => HomeConfig::default_location().context("Failed to locate the user config directory")?,
    };

    let dispatcher = Dispatcher::new(home_config, cwd).with_log_collector(log_collector);

    // Ctrl-C cancels the running task; child processes are killed by the executor
    let cancel = dispatcher.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    Ok(dispatcher.run_cli(&cli).await)
}
