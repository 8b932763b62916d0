use clap::{Parser, Subcommand};

use crate::ledger::PayeeCategory;

/// Clinic ledger CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "clinic-ledger",
    version,
    about = "Monthly salary and fee carry-forward ledger for clinic payees"
)]
pub struct Cli {
    /// Database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Address the HTTP API listens on (overrides LISTEN_ADDR)
    #[arg(long)]
    pub listen_addr: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve,

    /// Run the carry-forward batch for one category and month, then exit
    CarryForward {
        /// doctor, staff or patient
        #[arg(long)]
        category: PayeeCategory,

        #[arg(long)]
        month: u32,

        #[arg(long)]
        year: i32,
    },
}
