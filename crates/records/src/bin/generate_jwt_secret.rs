use clap::Parser;
use records::cli::parse_or_exit;
use records::secret::SecretCandidates;

#[derive(Parser, Debug)]
#[command(version, about = "Print three candidate JWT_SECRET values")]
struct Args {}

fn main() {
    let _args: Args = parse_or_exit();
    print!("{}", SecretCandidates::generate());
}
