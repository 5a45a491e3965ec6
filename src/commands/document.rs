use colored::Colorize;
use std::path::Path;

use crate::document::DocumentFormat;
use crate::llm::RetrievalPipeline;

pub async fn handle_command(
    command: &str,
    argument: &str,
    pipeline: &RetrievalPipeline,
) -> Result<(), String> {
    match command {
        "upload" => {
            if argument.is_empty() {
                return Err("Usage: upload <file_path>".to_string());
            }
            println!("📄 Indexing: {}", argument.bright_yellow());

            let bytes = tokio::fs::read(argument).await
                .map_err(|e| format!("Failed to read {}: {}", argument, e))?;
            let name = Path::new(argument)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let id = pipeline.ingest_bytes(&bytes, DocumentFormat::from_filename(&name)).await
                .map_err(|e| format!("Failed to index {}: {}", argument, e))?;

            println!("✅ Indexed as document {}", id.to_string().green());
            Ok(())
        },
        "add" => {
            let id = pipeline.ingest(argument).await
                .map_err(|e| format!("Failed to index text: {}", e))?;

            println!("✅ Indexed as document {}", id.to_string().green());
            Ok(())
        },
        "search" => {
            let results = pipeline.retrieve(argument, pipeline.top_k()).await
                .map_err(|e| format!("Failed to search: {}", e))?;

            if results.is_empty() {
                println!("No documents indexed yet.");
                return Ok(());
            }

            for (rank, doc) in results.iter().enumerate() {
                println!("{}. [#{} | distance {:.4}] {}",
                    rank + 1,
                    doc.id,
                    doc.distance,
                    doc.text.bright_green()
                );
            }
            Ok(())
        },
        _ => Err(format!("Unknown document command: {}", command))
    }
}
