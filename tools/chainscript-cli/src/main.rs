use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cases;
mod keys;

use cases::TestData;

/// ChainScript compatibility suite and segment tools
#[derive(Parser)]
#[command(name = "chainscript", version, about = "ChainScript CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Write the compatibility cases to a JSON file
    Generate {
        /// Output file
        path: PathBuf,
    },
    /// Validate a compatibility file produced by any implementation
    Validate {
        /// Input file
        path: PathBuf,
    },
    /// Print the hex link hash of a protobuf segment (or link with --link)
    Hash {
        /// Input file (or - for stdin)
        input: String,
        /// Input is a bare link rather than a segment
        #[arg(long)]
        link: bool,
    },
    /// Generate a key pair as PEM files
    Keygen {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Key algorithm
        #[arg(long, value_enum, default_value = "ed25519")]
        alg: keys::KeyAlgorithm,
    },
    /// Print the JSON view of a protobuf segment
    Inspect {
        /// Input file (or - for stdin)
        input: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chainscript=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate { path } => {
            let mut results = Vec::new();
            for case in cases::all() {
                let segment = case.generate()?;
                results.push(TestData {
                    id: case.id().to_string(),
                    data: cases::encode(&segment),
                });
            }
            std::fs::write(&path, serde_json::to_vec(&results)?)?;
            tracing::info!(path = %path.display(), cases = results.len(), "compatibility cases written");
        }
        Cmd::Validate { path } => {
            let raw = std::fs::read(&path)?;
            let entries: Vec<TestData> = serde_json::from_slice(&raw)?;
            let mut failed = 0usize;
            for entry in &entries {
                let Some(case) = cases::find(&entry.id) else {
                    println!("Unknown test case: {}", entry.id);
                    continue;
                };
                match cases::run(case.as_ref(), &entry.data) {
                    Ok(()) => println!("[{}] SUCCESS", entry.id),
                    Err(e) => {
                        failed += 1;
                        println!("[{}] FAILED: {e:#}", entry.id);
                    }
                }
            }
            if failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Cmd::Hash { input, link } => {
            let bytes = read_to_bytes_maybe_stdin(&input)?;
            let hash = if link {
                chainscript::unmarshal_link(&bytes)?.hash()?
            } else {
                let segment = chainscript::unmarshal_segment(&bytes)?;
                segment.link.ok_or(chainscript::Error::MissingLink)?.hash()?
            };
            println!("{hash}");
        }
        Cmd::Keygen { out, alg } => {
            let (private_path, public_path) = keys::write_pem_pair(&out, alg)?;
            println!("{}", private_path.display());
            println!("{}", public_path.display());
        }
        Cmd::Inspect { input } => {
            let bytes = read_to_bytes_maybe_stdin(&input)?;
            let segment = chainscript::unmarshal_segment(&bytes)?;
            println!("{}", serde_json::to_string_pretty(&segment)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read_to_bytes_maybe_stdin(path: &str) -> anyhow::Result<Vec<u8>> {
    if path == "-" {
        let mut v = Vec::new();
        io::stdin().read_to_end(&mut v)?;
        Ok(v)
    } else {
        Ok(std::fs::read(path)?)
    }
}
