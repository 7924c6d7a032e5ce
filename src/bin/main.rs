use ads_mcp_gateway::{AdsConfig, GatewayConfig, TokenSigner, start_http};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ads-mcp-gateway")]
#[command(about = "MCP gateway for advertising-account tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway HTTP server
    Serve {
        /// Bind address, e.g. 0.0.0.0:8080
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Issue a signed bearer token (for ops and debugging)
    IssueToken {
        /// Token lifetime in seconds
        #[arg(long, default_value_t = 86_400)]
        ttl_seconds: u64,
        /// Signing secret; defaults to the AUTH_SECRET environment variable
        #[arg(long, env = "AUTH_SECRET")]
        secret: String,
    },
    /// Verify a signed bearer token and report pass/fail
    CheckToken {
        token: String,
        #[arg(long, env = "AUTH_SECRET")]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ads_mcp_gateway=info".parse()?)
                .add_directive("rmcp=warn".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            let gateway_config = GatewayConfig::from_env();
            let ads_config = AdsConfig::from_env()?;
            info!("starting ads MCP gateway on {}", bind);
            start_http(&bind, gateway_config, ads_config).await?;
        }
        Commands::IssueToken {
            ttl_seconds,
            secret,
        } => {
            anyhow::ensure!(!secret.is_empty(), "signing secret must not be empty");
            let token = TokenSigner::new(secret).issue(ttl_seconds);
            println!("{token}");
        }
        Commands::CheckToken { token, secret } => {
            let valid = TokenSigner::new(secret).verify(&token);
            println!("{}", if valid { "valid" } else { "invalid" });
            if !valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
