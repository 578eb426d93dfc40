use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dewey")]
#[command(about = "Files finished media directories under their canonical titles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch the input directory until interrupted (default)
    Watch,
    /// Validate configuration and print the resolved values
    CheckConfig,
}
