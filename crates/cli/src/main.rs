use std::process::ExitCode;

fn main() -> ExitCode {
    quoteguard_cli::run()
}
