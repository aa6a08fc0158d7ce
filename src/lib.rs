pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;

use agent::WingmanAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    if let Some(base_url) = &args.chat_base_url {
        info!("Chat Base URL: {}", base_url);
    }
    info!("HTTP-Referer: {}", args.chat_http_referer);
    info!("App Title: {}", args.chat_app_title);
    info!("Prompts Path: {}", args.prompts_path);
    info!("History Cookie Prefix: {}", history::HISTORY_COOKIE_PREFIX);
    info!("History Retention: {} days", history::HISTORY_RETENTION_DAYS);
    info!("-------------------------");

    let agent = WingmanAgent::from_args(&args)?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
