//! Device server key management CLI

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use deviceserver::{validate_self_link, Client, Config};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "ds-cli", about = "Device server key management", long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    /// Log every request
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct ServerArgs {
    /// Device server entry point URL
    #[arg(long, env = "DS_URL")]
    url: String,

    /// Pre-shared signing key
    #[arg(long, env = "DS_PSK", hide_env_values = true)]
    psk: String,

    /// Organization asserted in request tokens
    #[arg(long, env = "DS_ORG_ID", default_value_t = 0)]
    org_id: i64,

    /// Skip TLS certificate verification
    #[arg(long, env = "DS_INSECURE")]
    insecure: bool,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new key/secret
    #[command(name = "create-key", visible_alias = "ck")]
    CreateKey {
        /// Name of the new key
        name: String,
    },

    /// List the known access keys
    #[command(name = "list-keys", visible_alias = "lk")]
    ListKeys,

    /// Delete the specified key
    #[command(name = "delete-key", visible_alias = "dk")]
    DeleteKey {
        /// Self URL of the key, as shown by list-keys
        self_url: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // reject foreign links before building a client or touching the network
    if let Commands::DeleteKey { self_url } = &cli.command {
        let base = Url::parse(&cli.server.url).context("invalid device server URL")?;
        validate_self_link(self_url, &base)?;
    }

    let client = Client::new(config(&cli.server)).context("failed to create client")?;
    let result = dispatch(&client, cli.command);
    client.close();
    result
}

fn config(server: &ServerArgs) -> Config {
    let config = Config::new(server.url.clone(), server.psk.clone())
        .with_org_id(server.org_id)
        .with_skip_tls_verify(server.insecure);

    match server.timeout {
        Some(secs) => config.with_timeout(Duration::from_secs(secs)),
        None => config,
    }
}

fn dispatch(client: &Client, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::CreateKey { name } => {
            let key = client.create_access_key(&name)?;
            println!("{}", serde_json::to_string_pretty(&key)?);
        }
        Commands::ListKeys => {
            let keys = client.access_keys()?;
            for (i, key) in keys.items.iter().enumerate() {
                let self_href = match key.links.get("self") {
                    Ok(link) => link.href.as_str(),
                    Err(_) => "? unable to find self link",
                };
                println!("[{}] '{}' = {}\n  {}\n", i, key.name, key.key, self_href);
            }
        }
        Commands::DeleteKey { self_url } => {
            client.delete_access_key(&self_url)?;
        }
    }

    Ok(())
}
