use policy_rag::api;
use policy_rag::commands::{CommandHandler, CommandOutcome};
use policy_rag::config::RagConfig;
use policy_rag::corpus::SEED_DOCUMENTS;
use policy_rag::llm::RetrievalPipeline;
use policy_rag::providers::openai::OpenAIProvider;
use policy_rag::providers::traits::{Embedder, Generator};
use policy_rag::providers::utils::{ExtractiveGenerator, HashEmbedder};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use rustyline::error::ReadlineError;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API key for the embedding and chat endpoints (defaults to OPENAI_API_KEY)
    #[arg(short, long)]
    api_key: Option<String>,

    /// Serve the HTTP API instead of the interactive prompt
    #[arg(long)]
    api: bool,

    #[arg(long, default_value = "3000")]
    port: u16,

    /// Use the deterministic local embedder and generator, no network
    #[arg(long)]
    offline: bool,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    max_new_tokens: Option<u32>,

    /// Extra seed documents, one per line
    #[arg(long)]
    seed_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = RagConfig::from_env();
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    if let Some(max_new_tokens) = args.max_new_tokens {
        config.max_new_tokens = max_new_tokens;
    }

    let pipeline = Arc::new(build_pipeline(&args, &config).await?);

    if args.api {
        run_api_server(&args, &config, pipeline).await
    } else {
        run_cli_mode(pipeline).await
    }
}

async fn build_pipeline(
    args: &Args,
    config: &RagConfig,
) -> Result<RetrievalPipeline, Box<dyn std::error::Error + Send + Sync>> {
    let (embedder, generator): (Arc<dyn Embedder>, Arc<dyn Generator>) = if args.offline {
        log::info!("Running offline with local embedder and extractive generator");
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let generator: Arc<dyn Generator> = Arc::new(ExtractiveGenerator);
        (embedder, generator)
    } else {
        let api_key = match &args.api_key {
            Some(key) => key.clone(),
            None => env::var("OPENAI_API_KEY")
                .map_err(|_| "API key must be provided via --api-key or OPENAI_API_KEY (or run with --offline)")?,
        };
        let provider = Arc::new(OpenAIProvider::new(api_key, config));
        let embedder: Arc<dyn Embedder> = provider.clone();
        let generator: Arc<dyn Generator> = provider;
        (embedder, generator)
    };

    let mut seeds: Vec<String> = SEED_DOCUMENTS.iter().map(|s| s.to_string()).collect();
    if let Some(path) = &args.seed_file {
        let content = tokio::fs::read_to_string(path).await
            .map_err(|e| format!("Failed to read seed file {}: {}", path.display(), e))?;
        seeds.extend(
            content.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    let pipeline = RetrievalPipeline::seeded(embedder, generator, config, seeds.as_slice()).await
        .map_err(|e| format!("Failed to build the seed corpus: {}", e))?;
    Ok(pipeline)
}

async fn run_cli_mode(pipeline: Arc<RetrievalPipeline>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut command_handler = CommandHandler::new(pipeline);

    // Show initial help menu
    command_handler.handle_command("help").await?;

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("👤 ") {
            Ok(line) => {
                let input = line.trim();
                let _ = rl.add_history_entry(input);

                match command_handler.handle_command(input).await {
                    Ok(CommandOutcome::Exit) => break,
                    Ok(CommandOutcome::Continue) => {}
                    Err(e) => println!("{}", e.red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

async fn run_api_server(
    args: &Args,
    config: &RagConfig,
    pipeline: Arc<RetrievalPipeline>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let app = api::create_api(pipeline, config);

    let listener = TcpListener::bind(&addr).await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Serving on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
