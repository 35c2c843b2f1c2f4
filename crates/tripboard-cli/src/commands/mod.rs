pub mod add;
pub mod clear;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod details;
pub mod edit;
pub mod history;
pub mod list;
pub mod new;
pub mod open;
pub mod share;
pub mod suggest;
pub mod vote;
pub mod watch;
