// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

mod config_cmd;
mod context_cmd;
mod model_cmd;
mod scan_cmd;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "codectx",
    about = "codectx - fit a code repository into a model's context window"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// build the context payload for a query
    Context {
        /// the question the context is for
        query: String,
        /// project root (defaults to the current directory)
        #[arg(long, short = 'p', default_value = ".")]
        path: String,
        /// model identifier, e.g. gpt-4o or llama3.1:8b
        #[arg(long, short = 'm')]
        model: Option<String>,
        /// off, smart, whole_repo, iterative or minimal
        #[arg(long, short = 's')]
        strategy: Option<String>,
        /// share of the model window to fill, in (0, 1]
        #[arg(long)]
        usage_fraction: Option<f64>,
        /// file the user referred to explicitly (repeatable)
        #[arg(long = "mention")]
        mentions: Vec<String>,
        /// file touched recently in the session (repeatable)
        #[arg(long)]
        recent: Vec<String>,
        /// output as JSON
        #[arg(long)]
        json: bool,
        /// wrap the payload in a ready-to-send prompt
        #[arg(long)]
        prompt: bool,
    },
    /// show the context window and budget for a model
    Model {
        /// model identifier
        identifier: String,
        /// share of the window to fill, in (0, 1]
        #[arg(long)]
        usage_fraction: Option<f64>,
    },
    /// list known model families and their context windows
    Models,
    /// list candidate files, ranked when a query or hints are given
    Scan {
        /// project root (defaults to the current directory)
        #[arg(long, short = 'p', default_value = ".")]
        path: String,
        /// rank files against this query
        #[arg(long, short = 'q')]
        query: Option<String>,
        /// file the user referred to explicitly (repeatable)
        #[arg(long = "mention")]
        mentions: Vec<String>,
        /// file touched recently in the session (repeatable)
        #[arg(long)]
        recent: Vec<String>,
        /// show each factor's contribution to the score
        #[arg(long)]
        explain: bool,
    },
    /// manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// show current configuration
    Show,
    /// set a configuration value, e.g. `context.weights.recent 80`
    Set { key: String, value: String },
    /// reset configuration to defaults
    Reset,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Context {
                query,
                path,
                model,
                strategy,
                usage_fraction,
                mentions,
                recent,
                json,
                prompt,
            } => {
                context_cmd::run(context_cmd::ContextArgs {
                    query,
                    path,
                    model,
                    strategy,
                    usage_fraction,
                    mentions,
                    recent,
                    json,
                    prompt,
                })
                .await
            }
            Commands::Model {
                identifier,
                usage_fraction,
            } => model_cmd::show(&identifier, usage_fraction).await,
            Commands::Models => model_cmd::list().await,
            Commands::Scan {
                path,
                query,
                mentions,
                recent,
                explain,
            } => scan_cmd::run(&path, query.as_deref(), &mentions, &recent, explain).await,
            Commands::Config { action } => match action {
                ConfigAction::Show => config_cmd::show().await,
                ConfigAction::Set { key, value } => config_cmd::set(&key, &value).await,
                ConfigAction::Reset => config_cmd::reset().await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_context_command() {
        let cli = Cli::try_parse_from([
            "codectx",
            "context",
            "how does caching work",
            "--model",
            "gpt-4o",
            "--mention",
            "src/cache.rs",
            "--mention",
            "src/lib.rs",
            "--usage-fraction",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Context {
                query,
                model,
                mentions,
                usage_fraction,
                path,
                ..
            } => {
                assert_eq!(query, "how does caching work");
                assert_eq!(model.as_deref(), Some("gpt-4o"));
                assert_eq!(mentions, vec!["src/cache.rs", "src/lib.rs"]);
                assert_eq!(usage_fraction, Some(0.5));
                assert_eq!(path, ".");
            }
            _ => panic!("expected context command"),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["codectx", "config", "set", "context.strategy", "minimal"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Set { .. }
            }
        ));
    }
}
