use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    calculator_mcp_server::cli::run().await
}
