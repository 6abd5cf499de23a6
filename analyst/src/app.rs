use crate::cli::Args;
use crate::inference::{OllamaConfig, OllamaProvider};
use crate::infrastructure::config::Settings;
use crate::sandbox::DockerSandbox;
use agent_sdk::{
    AgentEngine, AgentEngineBuilder, ConversationState, SessionOutcome, SessionReport,
};
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Prompt shown before each interactive question.
pub const PROMPT: &str = "You: ";

/// Builds the engine and answers the question given on the command line, or
/// starts an interactive chat when there is none.
///
/// # Errors
///
/// Returns an error on invalid configuration, unreadable resume files, model
/// service failures or terminal I/O errors.
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let config = args.run_config().context("Invalid configuration")?;

    let provider = OllamaProvider::new(OllamaConfig::from_settings(&settings.inference)?)?;
    let sandbox = DockerSandbox::new(&settings.sandbox);
    info!(
        model = %args.expert.model,
        temperature = args.expert.temperature,
        image = %sandbox.image(),
        "Expert configured"
    );

    let engine = AgentEngineBuilder::new()
        .provider(Arc::new(provider))
        .sandbox(Arc::new(sandbox))
        .config(config)
        .build()?;

    let prior = match &args.resume {
        Some(path) => {
            info!(path = %path.display(), "Starting from prior conversation");
            Some(ConversationState::load(path)?)
        }
        None => None,
    };

    let mut stdout = std::io::stdout();
    match args.question.as_deref() {
        Some(question) => {
            ask(&engine, question, prior, &mut stdout).await?;
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            interactive(&engine, stdin, &mut stdout, prior.unwrap_or_default()).await?;
        }
    }
    Ok(())
}

/// Runs one reasoning session and prints its final answer to `out`.
///
/// # Errors
///
/// Returns an error if the session fails or `out` cannot be written.
pub async fn ask<W: Write>(
    engine: &AgentEngine,
    question: &str,
    prior: Option<ConversationState>,
    out: &mut W,
) -> Result<SessionReport> {
    let report = engine.run(question, prior).await?;

    match &report.outcome {
        SessionOutcome::Answer(answer) if answer.trim().is_empty() => {
            warn!("Model finished without an answer");
        }
        SessionOutcome::Answer(answer) => {
            writeln!(out, "{answer}")?;
            out.flush()?;
        }
        SessionOutcome::MaxStepsReached | SessionOutcome::UnknownTool { .. } => {}
    }

    Ok(report)
}

/// Reads questions from `input` until `exit`, `quit` or end of input.
///
/// The conversation carries over between questions, including after
/// sessions that ended without an answer. Returns the final conversation.
///
/// # Errors
///
/// Returns an error if a session fails with a model-service error or the
/// terminal cannot be read or written.
pub async fn interactive<R, W>(
    engine: &AgentEngine,
    input: R,
    out: &mut W,
    mut history: ConversationState,
) -> Result<ConversationState>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Welcome to the Brio analyst. Type 'exit' or 'quit' to leave.")?;
    let mut lines = input.lines();

    loop {
        write!(out, "\n{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let report = ask(engine, question, Some(history.clone()), out).await?;
        history = report.conversation;
    }

    writeln!(out, "Goodbye!")?;
    Ok(history)
}
