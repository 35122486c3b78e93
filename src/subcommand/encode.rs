use super::*;

#[derive(Debug, Parser)]
pub struct EncodeCommand {
  #[arg(help = "Name to encode, e.g. `vitalik.eth`.")]
  name: Name,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Output {
  pub name: String,
  pub wire: String,
  pub labels: Vec<String>,
}

impl EncodeCommand {
  pub(crate) fn run(self, _settings: Settings) -> Result {
    print_json(Output {
      wire: hex::encode(self.name.as_wire()),
      labels: self
        .name
        .labels()
        .map(|label| String::from_utf8_lossy(label).into_owned())
        .collect(),
      name: self.name.to_string(),
    })
  }
}
