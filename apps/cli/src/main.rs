use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ConfigStore, RequestDispatcher, RunOutcome, SessionController, SkipReason,
};
use shared::domain::CompilerConfigModel;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    /// Base URL of the compiler service; overrides compiler-client.toml and env.
    #[arg(long)]
    server_url: Option<String>,
    /// Read the language catalog from a JSON file instead of the service.
    #[arg(long, conflicts_with = "builtin")]
    catalog: Option<PathBuf>,
    /// Use the stock Java/C++ catalog.
    #[arg(long)]
    builtin: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List languages and their compilers.
    Languages,
    /// Compile a source file (or the language's starter program).
    Compile {
        file: Option<PathBuf>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        compiler: Option<String>,
        #[arg(long)]
        options: Option<String>,
        /// Run the program after a successful compile.
        #[arg(long)]
        execute: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(server_url) = &cli.server_url {
        settings.server_url = server_url.clone();
    }
    let dispatcher = Arc::new(
        RequestDispatcher::from_settings(&settings)
            .with_context(|| format!("invalid server url '{}'", settings.server_url))?,
    );

    let store = ConfigStore::new();
    if cli.builtin {
        store.install(CompilerConfigModel::builtin()).await;
    } else if let Some(path) = &cli.catalog {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read catalog '{}'", path.display()))?;
        store.load_from_str(&raw).await?;
    } else {
        store
            .load(dispatcher.as_ref())
            .await
            .with_context(|| format!("failed to load catalog from {}", settings.server_url))?;
    }

    match cli.command {
        Command::Languages => print_languages(&store).await?,
        Command::Compile {
            file,
            language,
            compiler,
            options,
            execute,
        } => {
            let controller = SessionController::start(&store, dispatcher).await?;

            if let Some(language) = language {
                if !controller.select_language(&language).await {
                    bail!("unknown language '{language}'");
                }
            }
            if let Some(compiler) = compiler {
                if !controller.select_compiler(&compiler).await {
                    let session = controller.snapshot().await;
                    bail!(
                        "compiler '{compiler}' is not available for {}",
                        session.language.name
                    );
                }
            }
            if let Some(options) = options {
                controller.set_options(options).await;
            }
            if let Some(file) = file {
                let source = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("failed to read source '{}'", file.display()))?;
                controller.set_source_text(source).await;
            }
            controller.toggle_execution_view(execute).await;

            let session = controller.snapshot().await;
            info!(
                language = %session.language.id,
                compiler = %session.compiler.id,
                "compiling"
            );
            match controller.compile().await {
                RunOutcome::Skipped(SkipReason::Busy) => bail!("session is busy"),
                RunOutcome::Interrupted => bail!("compile was interrupted"),
                RunOutcome::Skipped(SkipReason::Unchanged) | RunOutcome::Finished { .. } => {}
            }

            let session = controller.snapshot().await;
            println!("== {} ({})", session.compiler.name, session.language.name);
            println!("{}", session.compile_output);
            if let Some(execution_output) = &session.execution_output {
                println!("== Execution");
                println!("{execution_output}");
            }
        }
    }

    Ok(())
}

async fn print_languages(store: &ConfigStore) -> Result<()> {
    let Some(catalog) = store.catalog().await else {
        bail!("no catalog loaded");
    };

    for language in catalog.languages() {
        let custom_args = if language.allow_custom_args {
            "custom args"
        } else {
            "fixed args"
        };
        println!(
            "{} ({}, .{}, {custom_args})",
            language.id, language.name, language.extension
        );
        let default_id = language.default_compiler().map(|c| c.id.clone());
        for compiler in &language.compilers {
            let marker = if Some(&compiler.id) == default_id.as_ref() {
                "*"
            } else {
                " "
            };
            println!(
                "  {marker} {} {} {} [{}]",
                compiler.id, compiler.name, compiler.version, compiler.default_args
            );
        }
    }
    Ok(())
}
