// crates/ghostsub-cli/src/main.rs

use clap::{Parser, Subcommand};

use ghostsub_cli::{cmd, logging};

#[derive(Parser)]
#[command(name = "ghostsub")]
#[command(about = "Free-token dictionary substitution compressor", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a file into a .boo artifact, or resume compressing a .boo
    Compress(cmd::compress::CompressArgs),

    /// Restore the original bytes from a .boo artifact
    Decompress(cmd::decompress::DecompressArgs),

    /// Inspect a .boo artifact (extension, rules, payload fingerprints)
    Inspect(cmd::inspect::InspectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Usage errors exit 1; --help and --version keep clap's exit 0.
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    logging::init();

    match cli.cmd {
        Commands::Compress(args) => cmd::compress::run(args),
        Commands::Decompress(args) => cmd::decompress::run(args),
        Commands::Inspect(args) => cmd::inspect::run(args),
    }
}
