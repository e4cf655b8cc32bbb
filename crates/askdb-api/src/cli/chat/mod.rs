//! Interactive chat for askdb.
//!
//! Streams answers as they are generated, supports slash commands, and keeps
//! the conversation in memory for the lifetime of the process. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
