//! Telegram Bot API tools for the Gemini CLI.
//!
//! A thin, stateless bridge: each named tool call maps one-to-one onto a
//! Telegram Bot API request, and the decoded payload is relayed back to
//! the CLI host unchanged.

pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod install;
pub mod registry;
pub mod telegram;
pub mod types;
