use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "riego")]
#[command(about = "Plant-watering reminders from your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a user account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Register a plant for a user
    Register(RegisterArgs),
    /// List a user's plants and their schedules
    View {
        #[arg(long)]
        username: String,
    },
    /// Record that a plant was watered today and refresh its schedule
    Water {
        /// ID of the plant
        #[arg(long)]
        id: i64,
    },
    /// Recompute a plant's schedule from the stored record
    Check {
        /// ID of the plant
        #[arg(long)]
        id: i64,
    },
    /// Send a reminder for every plant that is due for watering
    Due,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Owner of the plant
    #[arg(long)]
    pub username: String,
    /// Nickname of the plant
    #[arg(short = 'n', long = "name")]
    pub name: String,
    /// Species of the plant
    #[arg(short = 's', long = "species")]
    pub species: String,
    /// Days between waterings
    #[arg(short = 'f', long = "frequency")]
    pub frequency: Option<u32>,
    /// Last watered date, MM-DD-YYYY
    #[arg(long = "last-watered")]
    pub last_watered: Option<String>,
}
