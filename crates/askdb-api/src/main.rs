//! `askdb`: ask a database questions in plain language.

mod cli;
mod http;
mod state;

use clap_complete::generate;

use askdb_infra::config::load_config;
use askdb_infra::database::SqlxDatabase;
use askdb_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cli, dotenv) = Cli::parse_with_env(dotenvy::dotenv, std::env::args_os());

    if let Commands::Completions { shell } = cli.command {
        print_completions(shell);
        return Ok(());
    }

    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::Ask {
            question,
            retrieval,
            show_sql,
        } => {
            let question = question.join(" ");
            let pipeline = state::build_pipeline(&config, retrieval).await?;
            cli::ask::ask(&pipeline, &question, show_sql, cli.json, cli.quiet).await?;
        }

        Commands::Chat { retrieval } => {
            let pipeline = state::build_pipeline(&config, retrieval).await?;
            cli::chat::loop_runner::run_chat_loop(pipeline).await?;
        }

        Commands::Serve {
            host,
            port,
            retrieval,
        } => {
            let state = AppState::init(&config, retrieval).await?;

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} askdb API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }
            tracing::info!(%addr, "server started");

            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Schema { detailed } => {
            askdb_infra::config::require_database_url(&config)?;
            let database = SqlxDatabase::connect(&config.database).await?;
            cli::schema::show_schema(&database, detailed, cli.json).await?;
        }

        Commands::Completions { shell } => print_completions(shell),
    }

    Ok(())
}

fn print_completions(shell: clap_complete::Shell) {
    let mut cmd = <Cli as clap::CommandFactory>::command();
    generate(shell, &mut cmd, "askdb", &mut std::io::stdout());
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
