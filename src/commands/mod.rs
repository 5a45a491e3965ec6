use colored::Colorize;
use std::sync::Arc;

use crate::llm::RetrievalPipeline;

mod document;
mod system;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

/// Interactive front end over a retrieval pipeline.
pub struct CommandHandler {
    pipeline: Arc<RetrievalPipeline>,
}

impl CommandHandler {
    pub fn new(pipeline: Arc<RetrievalPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<CommandOutcome, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(CommandOutcome::Continue);
        }

        match input.to_lowercase().as_str() {
            "help" | "stats" | "exit" | "quit" => {
                return system::handle_command(input, &self.pipeline);
            }
            _ => {}
        }

        let (command, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let rest = rest.trim();
        let command = command.to_lowercase();

        match command.as_str() {
            "upload" | "add" | "search" => {
                document::handle_command(&command, rest, &self.pipeline).await?;
                Ok(CommandOutcome::Continue)
            }
            "ask" => {
                self.handle_chat(rest).await?;
                Ok(CommandOutcome::Continue)
            }
            // Anything else is a question.
            _ => {
                self.handle_chat(input).await?;
                Ok(CommandOutcome::Continue)
            }
        }
    }

    async fn handle_chat(&self, question: &str) -> Result<(), String> {
        let answer = self.pipeline.answer(question).await
            .map_err(|e| format!("Failed to answer: {}", e))?;

        println!("{}", answer.truecolor(255, 236, 179));
        println!();
        Ok(())
    }
}
