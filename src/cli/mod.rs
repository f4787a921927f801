pub mod commands;

use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;

use crate::cli::commands::{Commands, TicketAction};
use crate::config::AppConfig;
use crate::dashboard::{self, Board};
use crate::llm::ProviderFactory;
use crate::open_store;
use crate::session::{ConversationSession, SessionContext, SessionError};
use crate::store::{StoreError, Ticket, TicketStore};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("No usable LLM provider configured for `{0}`")]
    Provider(String),
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("The serve command is handled by the server entry point")]
    Serve,
}

pub async fn run_cli(command: Commands, config_path: String) -> Result<(), CliError> {
    let config = AppConfig::load(&config_path)?;

    match command {
        Commands::Serve => Err(CliError::Serve),
        Commands::Tickets { action } => {
            let store = open_store(&config.database)?;
            run_ticket_action(action, store.as_ref())
        }
        Commands::Chat { model } => run_repl(config, model).await,
    }
}

fn print_ticket_row(t: &Ticket) {
    println!(
        "{:<38} | {:<11} | {:<6} | {:<16} | {}",
        t.id.to_string(),
        t.status,
        t.priority,
        t.category,
        t.title
    );
}

fn run_ticket_action(action: TicketAction, store: &dyn TicketStore) -> Result<(), CliError> {
    match action {
        TicketAction::List { status } => {
            let tickets = match status {
                Some(status) => store.list_by_status(status)?,
                None => store.list()?,
            };
            if tickets.is_empty() {
                println!("No tickets found.");
                return Ok(());
            }
            println!("{:<38} | {:<11} | {:<6} | {:<16} | {}", "ID", "Status", "Prio", "Category", "Title");
            println!("{:-<38}-+-{:-<11}-+-{:-<6}-+-{:-<16}-+-{:-<20}", "", "", "", "", "");
            for t in &tickets {
                print_ticket_row(t);
            }
        }
        TicketAction::Show { id } => match store.get(id)? {
            Some(t) => {
                println!("Ticket:      {}", t.id);
                println!("Title:       {}", t.title);
                println!("Status:      {}", t.status);
                println!("Priority:    {}", t.priority);
                println!("Category:    {}", t.category);
                println!("Reporter:    {} <{}>", t.user_name, t.email);
                println!("Created At:  {}", t.created_at);
                if let Some(updated) = t.updated_at {
                    println!("Updated At:  {}", updated);
                }
                println!("---");
                println!("{}", t.description);
            }
            None => eprintln!("Ticket {} not found.", id),
        },
        TicketAction::Move { id, status } => {
            if dashboard::move_ticket(store, id, status)? {
                println!("Moved ticket {} to {}", id, status);
            } else {
                eprintln!("Ticket {} not found.", id);
            }
        }
        TicketAction::Board => {
            let board = Board::load(store)?;
            println!(
                "Total: {}  Backlog: {}  In Progress: {}  Resolved: {}",
                board.stats.total, board.stats.backlog, board.stats.in_progress, board.stats.resolved
            );
            for column in &board.columns {
                println!();
                println!("== {} ({})", column.title, column.tickets.len());
                for t in &column.tickets {
                    println!("  [{}] {} ({}, {})", t.id, t.title, t.priority, t.category);
                }
            }
        }
        TicketAction::Categories => {
            let categories = store.categories()?;
            if categories.is_empty() {
                println!("No tickets yet.");
            }
            for category in categories {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<Option<String>, CliError> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// What the chat REPL should do with one line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplInput {
    Exit,
    Skip,
    NothingToRetry,
    Send(String),
}

/// Interprets a REPL line. Any input acknowledges a pending failure;
/// `/retry` resends the message that failed, and is never sent literally.
pub fn resolve_input(session: &mut ConversationSession, line: String) -> ReplInput {
    match line.as_str() {
        "/exit" | "/quit" => return ReplInput::Exit,
        "/retry" => {
            return match session.clear_error() {
                Some(unsent) => ReplInput::Send(unsent),
                None => ReplInput::NothingToRetry,
            }
        }
        _ => {}
    }

    session.clear_error();
    if line.is_empty() {
        ReplInput::Skip
    } else {
        ReplInput::Send(line)
    }
}

async fn run_repl(config: AppConfig, model: Option<String>) -> Result<(), CliError> {
    let store = open_store(&config.database)?;
    let llm = ProviderFactory::create_default(&config).ok_or_else(|| CliError::Provider(config.llm.provider.clone()))?;
    let ctx = SessionContext::new(llm, Arc::clone(&store), &config.chat).with_model(model.or(config.llm.model.clone()));
    let mut session = ctx.new_session();

    println!("--- Support Chat ---");
    println!("Type /exit to quit.");
    println!("--------------------");
    for message in session.transcript() {
        println!("\nAssistant> {}", message.content);
    }

    loop {
        let Some(line) = prompt("\nYou> ")? else { break };
        let text = match resolve_input(&mut session, line) {
            ReplInput::Exit => break,
            ReplInput::Skip => continue,
            ReplInput::NothingToRetry => {
                println!("Nothing to retry.");
                continue;
            }
            ReplInput::Send(text) => text,
        };

        match session.submit(&ctx, &text).await {
            Ok(outcome) => {
                println!("\nAssistant> {}", outcome.reply);
                if let Some(ticket) = outcome.ticket {
                    println!("\n*** Ticket {} created ({}, {} priority). View it with `ticketdesk tickets board`. ***", ticket.id, ticket.category, ticket.priority);
                }
            }
            Err(SessionError::Model(reason)) => {
                eprintln!("\nI'm having trouble connecting right now: {}", reason);
                eprintln!("Type /retry to resend your last message, or keep typing to continue.");
            }
            Err(e) => eprintln!("\n{}", e),
        }
    }

    Ok(())
}
