use clap::{Parser, Subcommand};

/// Issues short-lived Retell web-call access tokens to browsers
#[derive(Parser)]
#[command(name = "webcall-token", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (overrides WEBCALL_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create one web call and print its access token as JSON
    CreateWebCall {
        #[arg(long, env = "RETELL_AGENT_ID")]
        agent_id: String,
    },
}
