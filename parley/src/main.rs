#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::Context;
use args::Args;
use clap::Parser;
use parley_chat::{Chat, ChatBackend, ChatOptions, Message, OllamaRuntime, ResponseType, ToolCall};
use parley_config::Config;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    parley_telemetry::init(&config.telemetry)?;

    tracing::info!(
        config_path = %args.config.display(),
        source = %config.chat.source,
        model = %config.chat.model_name,
        "starting parley"
    );

    let runtime = Arc::new(OllamaRuntime::new(&config.local));
    let backend = ChatBackend::new(&config.chat, runtime)?;

    let messages = conversation(&args)?;
    let options = ChatOptions {
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        thinking: args.thinking,
        ..ChatOptions::default()
    };

    // Cancel the in-flight call on Ctrl+C
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(cancel.clone()));

    if args.no_stream {
        let response = backend.chat(&messages, &options, &cancel).await?;

        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", response.content)?;
        print_tool_calls(&mut out, &response.tool_calls)?;

        tracing::info!(
            finish_reason = %response.finish_reason,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "chat completed"
        );
    } else {
        let mut stream = backend.chat_stream(&messages, &options, &cancel).await?;

        while let Some(event) = stream.recv().await {
            let mut out = std::io::stdout().lock();

            if event.response_type == ResponseType::ToolCall {
                tracing::info!(
                    tool_name = event.tool_name().unwrap_or_default(),
                    tool_call_id = event.tool_call_id().unwrap_or_default(),
                    "model started a tool call"
                );
                continue;
            }

            write!(out, "{}", event.content)?;
            out.flush()?;

            if event.done {
                writeln!(out)?;
                print_tool_calls(&mut out, event.tool_calls.as_deref().unwrap_or_default())?;
            }
        }
    }

    tracing::info!("parley finished");
    Ok(())
}

/// Assemble the message list from arguments, falling back to stdin for the prompt
fn conversation(args: &Args) -> anyhow::Result<Vec<Message>> {
    let prompt = match &args.prompt {
        Some(prompt) => prompt.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            buf
        }
    };

    anyhow::ensure!(!prompt.trim().is_empty(), "prompt is empty");

    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &args.system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(prompt));

    Ok(messages)
}

fn print_tool_calls(out: &mut impl Write, calls: &[ToolCall]) -> anyhow::Result<()> {
    for call in calls {
        writeln!(out, "{}", serde_json::to_string(call)?)?;
    }
    Ok(())
}

/// Wait for `SIGINT` and cancel the running call
async fn cancel_on_interrupt(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("interrupt received, cancelling");
            cancel.cancel();
        }
        Err(e) => tracing::warn!(error = %e, "failed to install Ctrl+C handler"),
    }
}
