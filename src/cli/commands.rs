use clap::Subcommand;

use super::run::RunArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Submit one study record and exit
    Run(RunArgs),

    /// Serve the entry form and submission API over HTTP
    Serve(ServeArgs),
}
