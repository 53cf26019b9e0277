use std::process::ExitCode;

fn main() -> ExitCode {
    gtmscout_cli::run()
}
