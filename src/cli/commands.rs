use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::store::TicketStatus;

#[derive(Parser)]
#[command(name = "ticketdesk", version, about = "Conversational support-ticket intake", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// File a ticket through an interactive terminal conversation
    Chat {
        /// Model override for this conversation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Inspect and triage tickets
    Tickets {
        #[command(subcommand)]
        action: TicketAction,
    },
}

#[derive(Subcommand)]
pub enum TicketAction {
    /// List tickets, optionally only those in one status
    List {
        #[arg(short, long)]
        status: Option<TicketStatus>,
    },

    /// Show a single ticket
    Show { id: Uuid },

    /// Move a ticket to another column (backlog, in-progress, resolved)
    Move { id: Uuid, status: TicketStatus },

    /// Print the kanban board with per-column counts
    Board,

    /// List the categories currently in use
    Categories,
}
