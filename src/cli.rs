use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sales")]
#[command(about = "Sales API - purchase records behind JWT role checks", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Print a signed access token for local testing
    IssueToken {
        /// Subject (principal) id carried in the token
        #[arg(short = 's', long)]
        subject: i64,

        /// Role granted to the subject; repeat for several roles
        #[arg(short = 'r', long = "role")]
        roles: Vec<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 9999)]
    pub port: u16,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl Cli {
    /// The subcommand to run, falling back to `serve` with top-level flags.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve(self.serve))
    }
}
