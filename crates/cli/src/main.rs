use std::process::ExitCode;

fn main() -> ExitCode {
    readygate_cli::run()
}
