use std::process::ExitCode;

fn main() -> ExitCode {
    apicatalog::cli::run()
}
