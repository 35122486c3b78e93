use super::*;

pub mod encode;
pub mod namehash;
pub mod resolve;

#[derive(Debug, Parser)]
pub enum Subcommand {
  #[command(about = "Resolve a name's records")]
  Resolve(resolve::ResolveCommand),
  #[command(about = "Print a name's EIP-137 node hash")]
  Namehash(namehash::NamehashCommand),
  #[command(about = "Print a name's DNS wire encoding")]
  Encode(encode::EncodeCommand),
}

impl Subcommand {
  pub fn run(self, settings: Settings) -> Result {
    match self {
      Self::Resolve(command) => command.run(settings),
      Self::Namehash(command) => command.run(settings),
      Self::Encode(command) => command.run(settings),
    }
  }
}

fn print_json(output: impl Serialize) -> Result {
  serde_json::to_writer_pretty(std::io::stdout(), &output)?;
  println!();
  Ok(())
}
