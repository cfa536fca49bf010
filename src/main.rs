//! Skiff CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skiff::agent_loop::{AgentLoop, LoopEvent, LoopEventPayload, LoopState};
use skiff::chat::{ChatSession, DEFAULT_SYSTEM_PROMPT};
use skiff::cli::{AskArgs, ChatArgs, Cli, Commands, ModelArgs, RunArgs};
use skiff::config::SkiffConfig;
use skiff::error::SkiffError;
use skiff::provider::{self, ModelProvider};
use skiff::types::GenerationSettings;

/// Exit status when the iteration limit ends a run.
const EXIT_ITERATION_LIMIT: i32 = 2;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skiff=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    let result = match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Chat(args) => handle_chat(args).await,
        Commands::Ask(args) => handle_ask(args).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn load_config(args: &ModelArgs) -> Result<SkiffConfig, SkiffError> {
    let mut config = SkiffConfig::load(args.config.as_deref())?;
    args.apply(&mut config)?;
    Ok(config)
}

fn generation_settings(config: &SkiffConfig) -> GenerationSettings {
    GenerationSettings {
        max_tokens: Some(config.max_tokens),
        temperature: config.temperature,
    }
}

/// Line-oriented operator input. Prompts go to stderr.
struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` at end of input.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>, SkiffError> {
        eprint!("{prompt}");
        std::io::stderr().flush()?;
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }
}

async fn handle_run(args: RunArgs) -> Result<i32, SkiffError> {
    let mut config = SkiffConfig::load(args.model.config.as_deref())?;
    args.apply(&mut config)?;

    let task = match args.task {
        Some(task) => task,
        None => Console::new()
            .read_line("What would you like me to do? ")
            .await?
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SkiffError::InvalidArgument("no task given".into()))?,
    };

    let mut agent = AgentLoop::from_config(&config)?;
    if !args.quiet {
        agent = agent.with_event_sink(Arc::new(print_event));
    }

    let report = agent.run(task).await;
    match (report.state, report.summary) {
        (LoopState::TerminatedByTool, Some(summary)) => {
            println!("{summary}");
            Ok(0)
        }
        _ => {
            eprintln!(
                "Stopped after {} iterations without a summary.",
                report.iterations
            );
            Ok(EXIT_ITERATION_LIMIT)
        }
    }
}

fn print_event(event: LoopEvent) {
    match event.payload {
        LoopEventPayload::Thinking { .. } => eprintln!("Agent thinking..."),
        LoopEventPayload::Response { text, .. } => eprintln!("Agent response: {text}"),
        LoopEventPayload::ActionResult { result, .. } => {
            eprintln!("Action result: {}", result.to_json_string())
        }
        LoopEventPayload::ProviderFailed { message, .. } => eprintln!("Model error: {message}"),
        _ => {}
    }
}

async fn handle_chat(args: ChatArgs) -> Result<i32, SkiffError> {
    let config = load_config(&args.model)?;
    let provider: Arc<dyn ModelProvider> =
        Arc::from(provider::create_provider(&config.model, &config)?);
    let system = args.system.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let mut session = ChatSession::new(provider, system, generation_settings(&config));

    eprintln!("Chatting with {} (empty line or Ctrl-D to quit)", config.model);
    let mut console = Console::new();
    while let Some(line) = console.read_line("> ").await? {
        if line.is_empty() {
            break;
        }
        println!("{}", session.send(line).await);
    }
    Ok(0)
}

async fn handle_ask(args: AskArgs) -> Result<i32, SkiffError> {
    let config = load_config(&args.model)?;
    let provider = provider::create_provider(&config.model, &config)?;
    let reply = ChatSession::ask(
        provider.as_ref(),
        args.system.as_deref(),
        &args.prompt,
        &generation_settings(&config),
    )
    .await;
    println!("{reply}");
    Ok(0)
}
