use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use replica_client::{ReplicaClient, Served};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "replica-cli")]
#[command(about = "Query replicas directly or through the load balancer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness and uptime
    Health,
    /// Host details of the answering replica
    Info,
    /// List every user
    Users,
    /// Create a user
    CreateUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Per-replica request statistics
    Stats,
    /// Send repeated health checks and count which replica answered each
    Probe {
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ReplicaClient::new(&cli.url);

    match cli.command {
        Commands::Health => print_served(client.health().await?)?,
        Commands::Info => print_served(client.server_info().await?)?,
        Commands::Users => print_served(client.list_users().await?)?,
        Commands::CreateUser { name, email } => {
            print_served(client.create_user(&name, &email).await?)?
        }
        Commands::Stats => print_served(client.stats().await?)?,
        Commands::Probe { count } => probe(&client, count).await,
    }

    Ok(())
}

async fn probe(client: &ReplicaClient, count: usize) {
    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    let mut failures = 0usize;

    for _ in 0..count {
        match client.health().await {
            Ok(served) => *tally.entry(served.body.server).or_default() += 1,
            Err(e) => {
                eprintln!("Error: {}", e);
                failures += 1;
            }
        }
    }

    println!("Distribution over {} requests to {}:", count, client.base_url());
    for (server, hits) in &tally {
        println!("  {:<24} {}", server, hits);
    }
    if failures > 0 {
        println!("  {:<24} {}", "(failed)", failures);
    }
}

fn print_served<T: Serialize>(served: Served<T>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(server) = &served.served_by {
        eprintln!("served by {}", server);
    }
    println!("{}", serde_json::to_string_pretty(&served.body)?);
    Ok(())
}
