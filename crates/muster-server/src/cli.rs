use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "muster-server", about = "Muster audit report server")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/muster.toml")]
    pub config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}
