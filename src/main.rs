//! Main application entry point for solarshift.
//!
//! Startup order matters: settings are validated before anything touches
//! the display, the instance lock is taken before the backend is created,
//! and the shutdown handler is installed before the first gamma change so a
//! Ctrl+C at any point still restores the ramps.

use anyhow::Result;
use clap::Parser;

use solarshift::args::Args;
use solarshift::config::{Config, Settings};
use solarshift::constants::EXIT_FAILURE;
use solarshift::lock::InstanceLock;
use solarshift::logger::Log;
use solarshift::scheduler::{RunMode, Scheduler, SchedulerState};
use solarshift::signals::{CancellationToken, install_shutdown_handler};
use solarshift::time_source::{Clock, SystemClock};
use solarshift::{GammaBackend, create_backend, solar_elevation};

fn run(args: &Args) -> Result<SchedulerState> {
    let (config, source) = Config::load(args.config.as_deref())?;
    let settings = Settings::resolve(args, &config, source)?;
    settings.log_settings();

    let _lock = match settings.mode {
        RunMode::Continuous => {
            let lock = InstanceLock::acquire(&InstanceLock::default_path())?;
            Log::log_decorated("Lock acquired, starting solarshift...");
            Some(lock)
        }
        RunMode::OneShot => None,
    };

    let cancel = CancellationToken::new();
    install_shutdown_handler(cancel.clone())?;

    Log::log_block_start(&format!("Initializing {} backend...", settings.method));
    let backend = create_backend(settings.method, settings.selector)?;
    Log::log_decorated(&format!("Using {} backend", backend.backend_name()));

    let now = SystemClock.now();
    Log::log_decorated(&format!(
        "Current solar elevation: {:.2}°",
        solar_elevation(now, settings.location)
    ));

    let mut scheduler = Scheduler::new(
        backend,
        SystemClock,
        settings.schedule_params(),
        cancel,
    );
    if settings.mode == RunMode::OneShot {
        Log::log_pipe();
        Log::log_info("Doing one-shot adjustment");
    }
    scheduler.run(settings.mode)
}

fn main() {
    let args = Args::parse();
    Log::set_verbosity(args.verbose);
    Log::log_version();

    match run(&args) {
        Ok(state) => {
            Log::log_block_start(match state {
                SchedulerState::Cancelled => "Shutting down solarshift...",
                _ => "Done",
            });
            Log::log_end();
        }
        Err(e) => {
            Log::log_pipe();
            Log::log_error(&format!("{:#}", e));
            Log::log_end();
            std::process::exit(EXIT_FAILURE);
        }
    }
}
