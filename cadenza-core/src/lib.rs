pub mod browser;
pub mod commands;
pub mod controller;
pub mod engine;
pub mod error;
pub mod output;
pub mod queue;
pub mod scanner;
pub mod track;
