use std::io;
use std::process::ExitCode;

use clap::Parser;

use tickerdesk::app::App;
use tickerdesk::components::debug_log::{install_panic_hook, set_global_debug_log};
use tickerdesk::components::DebugLogComponent;
use tickerdesk::config::{Cli, DeskConfig};
use tickerdesk::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use tickerdesk::tracing_sub;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match DeskConfig::try_from(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("tickerdesk: {message}");
            return ExitCode::from(2);
        }
    };
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("tickerdesk: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: DeskConfig) -> io::Result<()> {
    let (debug_log, handle) = DebugLogComponent::new_default();
    set_global_debug_log(handle);
    install_panic_hook();
    if !tracing_sub::init_default(config.log_level) {
        eprintln!("tickerdesk: logging was already initialised");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        session = %config.session_id,
        offline = config.offline,
        "starting"
    );

    let app = App::new(config, debug_log).map_err(io::Error::other)?;
    let mut output = ConsoleOutputDriver::new()?;
    app.run(ConsoleInputDriver::new(), &mut output)
}
