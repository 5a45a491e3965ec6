use colored::Colorize;

use super::CommandOutcome;
use crate::llm::RetrievalPipeline;

pub fn handle_command(input: &str, pipeline: &RetrievalPipeline) -> Result<CommandOutcome, String> {
    match input.to_lowercase().as_str() {
        "help" => {
            println!("\n💬 Questions:");
            println!("  Just type your question, or: ask <question>");
            println!("  Example: Can I work from home?");
            println!();

            println!("📄 Document Commands:");
            println!("  upload <file>   - Index a PDF or text file");
            println!("  add <text>      - Index a line of text");
            println!("  search <query>  - Show the closest documents");
            println!();

            println!("⚙️ System Commands:");
            println!("  stats - Show corpus size");
            println!("  help  - Show this help menu");
            println!("  exit  - Exit the program");
            println!();
            Ok(CommandOutcome::Continue)
        },
        "stats" => {
            let corpus = pipeline.corpus();
            println!("📚 Documents: {}", corpus.len().to_string().cyan());
            println!("📐 Dimensions: {}", corpus.dimension().to_string().cyan());
            println!("🔎 Context documents per answer: {}", pipeline.top_k().to_string().cyan());
            Ok(CommandOutcome::Continue)
        },
        "exit" | "quit" => {
            println!("👋 Goodbye!");
            Ok(CommandOutcome::Exit)
        },
        _ => Err("Unknown system command. Type 'help' for available commands.".to_string())
    }
}
