pub mod cli;
pub mod config;
pub mod env_detect;
pub mod env_setup;
pub mod exit_codes;
pub mod installer;
pub mod logging;
pub mod planner;
pub mod runner;

/// Run the command line interface and return an exit code.
pub fn run_cli() -> i32 {
    logging::init();

    match cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            exit_codes::UNHANDLED
        }
    }
}
