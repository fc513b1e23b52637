//! CLI entry point for provisioning a `PostgreSQL` database with privileges.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use pgsplit::classifier::diagnostics::Diagnostics;
use pgsplit::generator::provisioning::{self, ProvisionConfig};
use pgsplit::output::env_file;

#[derive(Parser)]
#[command(
    name = "provision",
    about = "Create a PostgreSQL database, grant privileges, and record its URL"
)]
struct Cli {
    /// Connection URL of a system-level database with CREATEDB privilege
    #[arg(long)]
    conn_url: String,

    /// Name of the database to create
    #[arg(long)]
    dbname: String,

    /// User granted ownership and full privileges
    #[arg(long)]
    owner: String,

    /// Template database
    #[arg(long, default_value = "template1")]
    template: String,

    /// Character encoding
    #[arg(long, default_value = "UTF8")]
    encoding: String,

    /// Write the new database URL into this .env file
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Environment variable name to write
    #[arg(long, default_value = "PG_DATABASE_URL")]
    env_var: String,

    /// Print verbose diagnostics
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut diagnostics = Diagnostics::new();
    let config = ProvisionConfig {
        dbname: cli.dbname.clone(),
        owner: cli.owner.clone(),
        template: cli.template.clone(),
        encoding: cli.encoding.clone(),
    };

    if let Err(e) =
        provisioning::create_database_with_privileges(&cli.conn_url, &config, &mut diagnostics)
    {
        eprintln!("Provisioning error: {e}");
        process::exit(2);
    }

    if let Some(env_path) = &cli.env_file {
        let new_url = match env_file::derive_database_url(&cli.conn_url, &cli.dbname) {
            Ok(url) => url,
            Err(e) => {
                eprintln!("URL error: {e}");
                process::exit(2);
            }
        };
        if let Err(e) = env_file::write_env_var(env_path, &cli.env_var, &new_url) {
            eprintln!("Env file error: {e}");
            process::exit(2);
        }
        println!("Wrote {} to {}", cli.env_var, env_path.display());
    }

    if cli.verbose {
        for record in diagnostics.records() {
            eprintln!("[{}] {}", record.level, record.message);
        }
    }

    println!("Database '{}' provisioned for '{}'.", cli.dbname, cli.owner);
}
