//! `repochat chat`: interactive or single-message chat mode.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use repochat_agent::{AgentError, AgentLoop, Session};
use repochat_core::event::EventBus;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Exit,
    Reset,
    System(String),
    /// `/system` with nothing after it
    SystemUsage,
    Message(String),
    Empty,
}

fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    if line.eq_ignore_ascii_case("/exit") {
        return ReplCommand::Exit;
    }
    if line.eq_ignore_ascii_case("/reset") {
        return ReplCommand::Reset;
    }
    if line == "/system" {
        return ReplCommand::SystemUsage;
    }
    if let Some(rest) = line.strip_prefix("/system ") {
        let prompt = rest.trim();
        return if prompt.is_empty() {
            ReplCommand::SystemUsage
        } else {
            ReplCommand::System(prompt.to_string())
        };
    }
    ReplCommand::Message(line.to_string())
}

pub async fn run(
    message: Option<String>,
    root: Option<PathBuf>,
    model: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(root, model)?;
    let tools = Arc::new(super::build_registry(&config)?);
    let provider = repochat_providers::build_from_config(&config)?;

    let agent = Arc::new(AgentLoop::from_config(
        &config,
        provider,
        tools.clone(),
        Arc::new(EventBus::default()),
    ));
    let mut session = agent.start_session(&config.system_prompt);

    if let Some(msg) = message {
        // Single message mode
        let result = submit(&mut session, &msg).await;
        session.end();
        return match result {
            Ok(reply) => {
                println!("{reply}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
    }

    match agent.provider().health_check().await {
        Ok(true) => {}
        Ok(false) => warn!(base_url = %config.base_url, "Model endpoint answered the health check with an error"),
        Err(e) => warn!(base_url = %config.base_url, error = %e, "Model endpoint is not reachable"),
    }

    println!();
    println!("  repochat: interactive mode");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Root:      {}", tools.root().display());
    println!();
    println!("  Commands: /exit to quit, /system <text> to set the system prompt, /reset to clear");
    println!("  Ctrl+C cancels a reply in progress.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => break,
            ReplCommand::Reset => {
                session.reset();
                println!("Conversation reset.");
            }
            ReplCommand::SystemUsage => println!("Usage: /system <text>"),
            ReplCommand::System(prompt) => {
                session.set_system_prompt(&prompt);
                println!("System prompt updated and conversation reset.");
            }
            ReplCommand::Message(text) => match submit(&mut session, &text).await {
                Ok(reply) => println!("AI: {reply}"),
                Err(AgentError::Cancelled) => println!("(cancelled)"),
                Err(e) => eprintln!("Error generating response: {e}"),
            },
        }
    }

    session.end();
    println!("Goodbye!");
    Ok(())
}

async fn submit(session: &mut Session, text: &str) -> Result<String, AgentError> {
    let outcome = session.submit_until(text, tokio::signal::ctrl_c()).await?;
    Ok(outcome.text().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("  "), ReplCommand::Empty);
        assert_eq!(parse_line("/exit"), ReplCommand::Exit);
        assert_eq!(parse_line("/EXIT"), ReplCommand::Exit);
        assert_eq!(parse_line("/reset"), ReplCommand::Reset);
        assert_eq!(
            parse_line("/system You are terse."),
            ReplCommand::System("You are terse.".into())
        );
        assert_eq!(parse_line("/system"), ReplCommand::SystemUsage);
        assert_eq!(parse_line("/system    "), ReplCommand::SystemUsage);
    }

    #[test]
    fn everything_else_is_a_message() {
        assert_eq!(
            parse_line(" What changed in the last commit? "),
            ReplCommand::Message("What changed in the last commit?".into())
        );
        assert_eq!(parse_line("/systemic"), ReplCommand::Message("/systemic".into()));
    }
}
