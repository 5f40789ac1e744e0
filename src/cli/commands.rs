use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clearance")]
#[command(about = "Police clearance registry: fingerprints, offences and clearance applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (extension optional)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve,

    /// Create the database and print the active configuration
    Init,

    /// Show record counts
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List registered users, newest first
    Users {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Grant the admin role to a registered user
    Promote {
        /// Email the user signed in with
        email: String,
    },

    /// List offences recorded against a user
    Offences {
        user_id: i64,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Check whether an uploaded image makes a user eligible for clearance
    Verify {
        user_id: i64,

        /// File name of the uploaded image
        #[arg(long)]
        image_name: String,

        /// Size of the uploaded image in bytes
        #[arg(long)]
        image_size: u64,
    },
}
