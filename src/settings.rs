use {super::*, crate::resolver::ResolverConfig};

/// Merged configuration: command-line options over an optional YAML
/// config file over defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
  #[serde(default)]
  pub gateway_urls: Vec<String>,
  pub root_registry: Option<Address>,
  pub eth_registry: Option<Address>,
  pub timestamp: Option<u64>,
}

impl Settings {
  pub fn load(options: Options) -> Result<Self> {
    let file = match &options.config {
      Some(path) => {
        let yaml = fs::read_to_string(path)
          .with_context(|| format!("failed to read config file `{}`", path.display()))?;
        serde_yaml::from_str::<Settings>(&yaml)
          .with_context(|| format!("failed to parse config file `{}`", path.display()))?
      }
      None => Self::default(),
    };

    Ok(Self {
      gateway_urls: if options.gateway_url.is_empty() {
        file.gateway_urls
      } else {
        options.gateway_url
      },
      root_registry: options.root_registry.or(file.root_registry),
      eth_registry: options.eth_registry.or(file.eth_registry),
      timestamp: options.timestamp.or(file.timestamp),
    })
  }

  pub fn resolver_config(&self) -> Result<ResolverConfig> {
    Ok(ResolverConfig {
      root_registry: self
        .root_registry
        .ok_or_else(|| anyhow!("--root-registry is required"))?,
      eth_registry: self
        .eth_registry
        .ok_or_else(|| anyhow!("--eth-registry is required"))?,
      eth_suffix: "eth".parse().expect("static name"),
      burn_address: burn_address(),
    })
  }

  pub fn now(&self) -> u64 {
    self.timestamp.unwrap_or_else(|| {
      std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
    })
  }
}
