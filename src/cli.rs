use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use resi_tracker::{
    TrackingClient, TrackingData,
    config::Config,
    couriers::{KNOWN_COURIERS, find_courier, parse_share_link, share_link},
    proxy,
    store::FileStore,
    transport::ReqwestTransport,
};

#[derive(Debug, Parser)]
#[command(name = "resi-tracker")]
#[command(about = "Track Indonesian courier shipments through KlikResi", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the tracking proxy.
    Serve,

    /// Track a package through the proxy.
    Track {
        /// Tracking number (AWB/resi). Defaults to the last one tracked.
        awb: Option<String>,

        /// Courier code, e.g. `jne`. Defaults to the last one tracked.
        courier: Option<String>,

        /// Take the query from a share link (`?courier=..&noresi=..`).
        #[arg(long, conflicts_with_all = ["awb", "courier"])]
        link: Option<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Also print a share link rooted at this URL.
        #[arg(long)]
        share_base: Option<String>,
    },

    /// List known courier codes.
    Couriers,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let config = Config::from_env()?;
        tracing::debug!("loaded config for upstream {}", config.klikresi_url);

        match cli.command {
            CliCommand::Serve => {
                let transport = Arc::new(ReqwestTransport::new()?);
                proxy::serve(config, transport).await?;
            }
            CliCommand::Track {
                awb,
                courier,
                link,
                json,
                share_base,
            } => {
                let store_path = match &config.last_used_path {
                    Some(path) => path.clone(),
                    None => FileStore::default_path()?,
                };
                let client = TrackingClient::new(
                    config.proxy_url.clone(),
                    Arc::new(ReqwestTransport::new()?),
                    Arc::new(FileStore::new(store_path)),
                )
                .with_api_key(config.klikresi_api_key.clone());

                let (awb, courier) = match link {
                    Some(link) => parse_share_link(&link)?
                        .context("share link needs both `courier` and `noresi`")?,
                    None => {
                        let last = client.last_used();
                        let awb = awb.or_else(|| last.as_ref().map(|q| q.awb.clone()));
                        let courier = courier.or_else(|| last.as_ref().map(|q| q.courier.clone()));
                        match (awb, courier) {
                            (Some(awb), Some(courier)) => (awb, courier),
                            _ => bail!("awb & courier required"),
                        }
                    }
                };

                if find_courier(&courier).is_none() {
                    tracing::warn!("{courier} is not a known courier code");
                }

                let data = client.track(&awb, &courier).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                } else {
                    print_tracking(&data);
                    if let Some(base) = share_base {
                        println!("🔗 {}", share_link(&base, &awb, &courier)?);
                    }
                }
            }
            CliCommand::Couriers => {
                for courier in KNOWN_COURIERS {
                    println!("{:<10} {}", courier.code, courier.name);
                }
            }
        }

        Ok(())
    }
}

fn print_tracking(data: &TrackingData) {
    println!("📦 Tracking: {}", data.awb);
    println!("🚚 Courier: {}", data.courier);
    println!("📍 Status: {}", data.status);
    if let Some(origin) = &data.origin {
        println!("From: {origin}");
    }
    if let Some(receiver) = &data.receiver {
        println!("Receiver: {receiver}");
    }
    if let Some(destination) = &data.destination {
        println!("To: {destination}");
    }
    println!("================================");
    for entry in &data.history {
        println!("{}  {}", entry.date, entry.description);
    }
}
