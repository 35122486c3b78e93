use super::*;

#[derive(Debug, Parser)]
pub struct NamehashCommand {
  #[arg(help = "Name to hash, e.g. `vitalik.eth`.")]
  name: Name,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Output {
  pub name: String,
  pub node: B256,
}

impl NamehashCommand {
  pub(crate) fn run(self, _settings: Settings) -> Result {
    print_json(Output {
      node: self.name.node(),
      name: self.name.to_string(),
    })
  }
}
