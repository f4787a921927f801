use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use ticketdesk::cli::{commands::{Cli, Commands}, run_cli};
use ticketdesk::config::AppConfig;
use ticketdesk::llm::ProviderFactory;
use ticketdesk::open_store;
use ticketdesk::session::{SessionContext, SessionRegistry};
use tracing::{error, info};

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, cli.config).await {
            error!("{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting ticketdesk server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = match open_store(&config.database) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize ticket store: {}", e);
            std::process::exit(1);
        }
    };

    let llm_provider = match ProviderFactory::create_default(&config) {
        Some(p) => p,
        None => {
            error!("Failed to initialize LLM provider `{}` from configuration", config.llm.provider);
            std::process::exit(1);
        }
    };

    info!(
        "Using LLM provider {} (model override: {})",
        llm_provider.name(),
        config.llm.model.as_deref().unwrap_or("none")
    );

    let ctx = SessionContext::new(llm_provider, store.clone(), &config.chat).with_model(config.llm.model.clone());
    let registry = web::Data::new(SessionRegistry::new(ctx));
    let store = web::Data::new(store);

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .app_data(store.clone())
            .route("/health", web::get().to(health))
            .configure(ticketdesk::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
