use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
  #[arg(long, help = "Load configuration from <CONFIG>.")]
  pub(crate) config: Option<PathBuf>,
  #[arg(
    long = "gateway-url",
    help = "Fetch remote-storage proofs from <GATEWAY_URL>. May be repeated; tried in order."
  )]
  pub(crate) gateway_url: Vec<String>,
  #[arg(long, help = "Use <ROOT_REGISTRY> as the local registry root.")]
  pub(crate) root_registry: Option<Address>,
  #[arg(
    long,
    help = "Use <ETH_REGISTRY> as the remote registry owning the eth TLD."
  )]
  pub(crate) eth_registry: Option<Address>,
  #[arg(
    long,
    help = "Evaluate expiries against <TIMESTAMP> instead of the current time."
  )]
  pub(crate) timestamp: Option<u64>,
}
