use {clap::Parser, ens2::Arguments};

fn main() {
  env_logger::init();

  if let Err(error) = Arguments::parse().run() {
    eprintln!("error: {error:?}");
    std::process::exit(1);
  }
}
