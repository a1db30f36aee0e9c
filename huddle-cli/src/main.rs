use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use huddle_client::{ClientConfig, RoomServiceError, RoomsApi};
use huddle_core::{RoomId, RoomKey};
use huddle_server::{AppState, ServerConfig, serve};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Signaling relay and room tools for huddle calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the room service and signaling relay.
    Serve {
        /// Overrides HUDDLE_ADDR.
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Create a room and print its credentials.
    Create {
        /// Overrides HUDDLE_BACKEND_URL.
        #[arg(long)]
        server: Option<String>,
    },

    /// Check that a room exists and the key opens it.
    Verify {
        room_id: String,
        room_key: String,

        #[arg(long)]
        server: Option<String>,
    },

    Health {
        #[arg(long)]
        server: Option<String>,
    },
}

fn rooms_api(server: Option<String>) -> RoomsApi {
    let backend = server.unwrap_or_else(|| ClientConfig::from_env().backend_url);
    RoomsApi::new(backend)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Serve { addr } => {
            let mut config = ServerConfig::from_env()?;
            if let Some(addr) = addr {
                config.addr = addr;
            }

            let listener = TcpListener::bind(config.addr)
                .await
                .with_context(|| format!("Failed to bind {}", config.addr))?;
            println!("{} {}", "🚀 Relay listening on".green().bold(), config.addr);
            serve(listener, AppState::new()).await?;
        }

        Commands::Create { server } => {
            let creds = rooms_api(server)
                .create_room()
                .await
                .context("Failed to create room")?;

            println!("{}", "✨ Room created".green().bold());
            println!("   Room ID:  {}", creds.room_id.as_str().cyan());
            println!("   Room key: {}", creds.room_key.as_str().cyan());
        }

        Commands::Verify {
            room_id,
            room_key,
            server,
        } => {
            let room_id = RoomId(room_id);
            match rooms_api(server)
                .verify_room(&room_id, &RoomKey(room_key))
                .await
            {
                Ok(()) => println!("{} {}", "✔ Room is open:".green().bold(), room_id),
                Err(e @ (RoomServiceError::RoomNotFound(_) | RoomServiceError::InvalidKey(_))) => {
                    println!("{} {}", "✘".red().bold(), e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Failed to reach the room service"),
            }
        }

        Commands::Health { server } => {
            let report = rooms_api(server)
                .health()
                .await
                .context("Room service is unreachable")?;

            println!(
                "{} {} ({} active rooms, {})",
                "Status:".bold(),
                report.status.green(),
                report.active_rooms,
                report.timestamp.to_rfc3339()
            );
        }
    }

    Ok(())
}
