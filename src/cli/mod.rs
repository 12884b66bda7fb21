use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::infra::config::Config;
use crate::infra::{boot, logging};
use crate::tools::registry::build_registry;

#[derive(Parser)]
#[command(name = "calculator-mcp-server")]
#[command(about = "Calculator MCP server over stdio")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,
    /// Print the registered tool descriptors as JSON
    Tools,
    /// Validate and print the effective configuration
    Config,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&cfg.log_level);

    match command {
        Commands::Serve => match boot::run_server(&cfg).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "fatal error in server loop");
                eprintln!("Fatal error: {:#}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Tools => match render_tools() {
            Ok(out) => {
                println!("{}", out);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Tool registration failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config => match render_config(&cfg) {
            Ok(out) => {
                println!("✅ Configuration is valid");
                println!("{}", out);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn render_tools() -> Result<String, Box<dyn std::error::Error>> {
    let registry = build_registry()?;
    let body = serde_json::json!({ "tools": registry.list() });
    Ok(serde_json::to_string_pretty(&body)?)
}

fn render_config(cfg: &Config) -> Result<String, Box<dyn std::error::Error>> {
    if cfg.server_name.trim().is_empty() {
        return Err("server_name cannot be empty".into());
    }
    Ok(toml::to_string(cfg)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn parses_default_and_subcommands() {
        let cli = Cli::try_parse_from(["calculator-mcp-server"]).unwrap();
        assert!(cli.command.is_none());
        let cli = Cli::try_parse_from(["calculator-mcp-server", "tools"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Tools));
        assert!(Cli::try_parse_from(["calculator-mcp-server", "bogus"]).is_err());
    }

    #[test]
    fn render_tools_lists_sum() {
        let out = render_tools().unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["tools"][0]["name"], "sum");
    }

    #[test]
    fn render_config_rejects_empty_name() {
        let cfg = Config { server_name: " ".into(), ..Config::default() };
        assert!(render_config(&cfg).unwrap_err().to_string().contains("server_name"));
        let ok = render_config(&Config::default()).unwrap();
        assert!(ok.contains("server_name = \"Calculator MCP Server\""));
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_config_success() {
        env::remove_var("MCP_CONFIG");
        let code = run_commands(Commands::Config).await;
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_config_failure() {
        env::set_var("MCP_CONFIG", "/nope/missing.toml");
        let code = run_commands(Commands::Tools).await;
        assert_eq!(code, ExitCode::FAILURE);
        env::remove_var("MCP_CONFIG");
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_tools_success() {
        env::remove_var("MCP_CONFIG");
        let code = run_commands(Commands::Tools).await;
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
