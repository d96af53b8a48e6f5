use std::process::ExitCode;

fn main() -> ExitCode {
    match scenelinkd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "scenelinkd exited with an error");
            ExitCode::FAILURE
        }
    }
}
