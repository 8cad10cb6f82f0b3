use super::Parser;

#[derive(Parser, Debug)]
pub struct Cli {
    /// Settings file, without or with its `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long)]
    pub log_json: bool,
}
