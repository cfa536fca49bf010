//! Skiff: a minimal LLM agent loop.
//!
//! A run keeps an append-only [`Conversation`](conversation::Conversation),
//! asks a model for the next step, interprets the reply as one
//! [`Action`](action::Action), dispatches it to a registered tool and feeds the
//! result back, until the model calls `terminate` or the iteration budget runs
//! out. Failures along the way become feedback in the conversation rather
//! than errors.
//!
//! # Quick Start
//!
//! ```no_run
//! use skiff::agent_loop::AgentLoop;
//! use skiff::config::SkiffConfig;
//!
//! # async fn example() -> skiff::error::Result<()> {
//! let config = SkiffConfig::load(None)?;
//! let report = AgentLoop::from_config(&config)?
//!     .run("What does main.py do?")
//!     .await;
//! if let Some(summary) = report.summary {
//!     println!("{summary}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod agent_loop;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
