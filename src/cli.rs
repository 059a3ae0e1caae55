//! Terminal front-end: a line-based chat REPL.

use crate::catalog::ModelCatalog;
use crate::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::provider::ProviderRegistry;
use crate::session::{Session, SettingsUpdate};
use crate::stream::{render_turn, TurnDelta, TurnEvent, TurnOutcome};
use anyhow::Context as _;
use futures::StreamExt;
use playground_core::Message;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    NewConversation,
    Models,
    Message(String),
    Empty,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Input::Empty,
            "/quit" | "/exit" => Input::Quit,
            "/new" => Input::NewConversation,
            "/models" => Input::Models,
            text => Input::Message(text.to_string()),
        }
    }
}

/// Prints the catalog, one model per line
pub fn print_models(catalog: &ModelCatalog) {
    for (index, spec) in catalog.models().iter().enumerate() {
        println!(
            "{:>2}  {:<40} {:<8} temperature {}..{} (default {}), max tokens {}",
            index,
            spec.name,
            spec.provider,
            spec.temperature_min,
            spec.temperature_max,
            spec.temperature_default,
            spec.max_completion_tokens
        );
    }
}

pub async fn run_chat(
    catalog: &ModelCatalog,
    providers: &ProviderRegistry,
    options: OrchestratorOptions,
    settings: SettingsUpdate,
) -> anyhow::Result<()> {
    let mut session = Session::new(catalog);
    session.update_settings(catalog, settings)?;

    println!(
        "Chatting with {} (temperature {}, max tokens {}).",
        session.settings.model, session.settings.temperature, session.settings.max_completion_tokens
    );
    println!("Type /new for a new conversation, /models to list models, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nyou> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match Input::parse(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Models => print_models(catalog),
            Input::NewConversation => {
                session.reset();
                println!("Started a new conversation.");
            }
            Input::Message(text) => {
                if let Err(err) = chat_turn(catalog, providers, &options, &mut session, text).await {
                    eprintln!("error: {:#}", err);
                }
            }
        }
    }
    Ok(())
}

async fn chat_turn(
    catalog: &ModelCatalog,
    providers: &ProviderRegistry,
    options: &OrchestratorOptions,
    session: &mut Session,
    text: String,
) -> anyhow::Result<()> {
    let index = session.model_index(catalog)?;
    let Some(model) = providers.get_model_instance(catalog, index, session.settings.params())? else {
        let provider = catalog.get(index).map(|spec| spec.provider.as_str()).unwrap_or_default();
        println!("No model instance found for provider {}", provider);
        return Ok(());
    };
    let orchestrator = Orchestrator::new(model, options.clone())?;

    let mut messages = session.transcript.messages();
    messages.push(Message::human(text.clone()));
    let mut turn = render_turn(orchestrator.invoke(messages));

    print!("assistant> ");
    std::io::stdout().flush()?;
    while let Some(event) = turn.next().await {
        match event.context("chat turn failed")? {
            TurnEvent::Step(node) => tracing::debug!(%node, "entering node"),
            TurnEvent::Delta(TurnDelta::Token(text)) => {
                print!("{}", text);
                std::io::stdout().flush()?;
            }
            TurnEvent::Delta(_) => {}
            TurnEvent::Finished(outcome) => {
                println!();
                print_details(&outcome);
                session.push_user(text.clone());
                session.push_assistant(outcome.response);
            }
        }
    }
    Ok(())
}

fn print_details(outcome: &TurnOutcome) {
    if let Some(reasoning) = outcome.reasoning.as_deref().filter(|r| !r.trim().is_empty()) {
        println!("\n[reasoning]\n{}", reasoning.trim());
    }
    if let Some(usage) = outcome.usage {
        println!(
            "[usage] prompt {} + completion {} = {} tokens",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }
}
