//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Protocol, SkiffConfig};
use crate::error::SkiffError;

/// Skiff: a minimal tool-using LLM agent
#[derive(Parser, Debug)]
#[command(name = "skiff", version, about = "Skiff: a minimal tool-using LLM agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the agent loop on a task
    Run(RunArgs),
    /// Chat with a model, keeping the conversation in memory
    Chat(ChatArgs),
    /// Ask a single question
    Ask(AskArgs),
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Model to use (format: provider:model, e.g. ollama:qwen2.5:14b)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Max tokens per completion
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Config file (defaults to skiff.toml in the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ModelArgs {
    /// Apply these flags on top of `config`.
    pub fn apply(&self, config: &mut SkiffConfig) -> Result<(), SkiffError> {
        if let Some(model) = &self.model {
            config.model = model.parse()?;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if self.temperature.is_some() {
            config.temperature = self.temperature;
        }
        Ok(())
    }
}

/// Arguments for `skiff run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// How the model expresses actions (fenced or native)
    #[arg(short, long)]
    pub protocol: Option<Protocol>,

    /// Stop after this many iterations
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Directory the file tools operate in
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Only print the final summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Task for the agent; read from stdin when omitted
    pub task: Option<String>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut SkiffConfig) -> Result<(), SkiffError> {
        self.model.apply(config)?;
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.set_max_iterations(max_iterations)?;
        }
        if let Some(workdir) = &self.workdir {
            config.workdir = workdir.clone();
        }
        Ok(())
    }
}

/// Arguments for `skiff chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,
}

/// Arguments for `skiff ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// User prompt
    pub prompt: String,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LanguageModel;

    #[test]
    fn parse_run_with_defaults() {
        let cli = Cli::try_parse_from(["skiff", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert!(args.task.is_none());
                assert!(args.protocol.is_none());
                assert!(args.model.model.is_none());
                assert!(!args.quiet);
            }
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn parse_run_with_all_options() {
        let cli = Cli::try_parse_from([
            "skiff",
            "run",
            "-m",
            "openai:gpt-4o-mini",
            "--protocol",
            "native",
            "--max-iterations",
            "3",
            "--max-tokens",
            "512",
            "-w",
            "/tmp/project",
            "-q",
            "what does main.py do?",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected Run");
        };

        let mut config = SkiffConfig::default();
        args.apply(&mut config).unwrap();
        assert_eq!(config.model, LanguageModel::OpenAi("gpt-4o-mini".into()));
        assert_eq!(config.protocol, Protocol::Native);
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.workdir, PathBuf::from("/tmp/project"));
        assert!(args.quiet);
        assert_eq!(args.task.as_deref(), Some("what does main.py do?"));
    }

    #[test]
    fn run_rejects_zero_iterations() {
        let cli = Cli::try_parse_from(["skiff", "run", "--max-iterations", "0"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected Run");
        };
        assert!(args.apply(&mut SkiffConfig::default()).is_err());
    }

    #[test]
    fn parse_unknown_protocol_is_error() {
        assert!(Cli::try_parse_from(["skiff", "run", "--protocol", "xml"]).is_err());
    }

    #[test]
    fn parse_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["skiff", "ask"]).is_err());
        let cli = Cli::try_parse_from(["skiff", "ask", "-s", "Be brief", "Hello"]).unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.system.as_deref(), Some("Be brief"));
                assert_eq!(args.prompt, "Hello");
            }
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["skiff"]).is_err());
    }
}
