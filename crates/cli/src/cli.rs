//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "rewardpilot", version, about = "Run rewards API sessions for every configured account")]
pub struct Cli {
    /// Config file (TOML or JSON); standard locations are probed when omitted
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Route each account through its proxy
    #[arg(long, conflicts_with = "no_proxy")]
    pub use_proxy: bool,

    /// Connect directly even if the config enables proxies
    #[arg(long)]
    pub no_proxy: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Proxy mode forced on the command line, if any.
    pub fn proxy_override(&self) -> Option<bool> {
        match (self.use_proxy, self.no_proxy) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
