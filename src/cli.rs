use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "snip", version, about = "Map long URLs to short codes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP front end (default)
    Serve,
    /// Run the interactive console menu
    Console,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
