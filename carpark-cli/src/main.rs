//! Entry point for the `carpark` binary.
#![forbid(unsafe_code)]

use carpark_cli::CliError;

fn main() {
    pretty_env_logger::init();
    match carpark_cli::run() {
        Ok(()) => {}
        // Help and version requests exit 0; usage errors keep clap's status.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("carpark: {err}");
            std::process::exit(1);
        }
    }
}
