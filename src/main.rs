use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use int4_export::export::{export_all, ExportMode};
use int4_export::provider::CheckpointDir;

#[derive(Parser, Debug)]
#[command(
    name = "int4-export",
    about = "Quantize checkpoint weight tensors to packed INT4"
)]
struct Args {
    /// Directory holding one shape-prefixed <name>.bin per tensor.
    checkpoint_dir: PathBuf,

    /// Output directory for <name>.int4 and <name>.scale files.
    #[arg(long)]
    out: PathBuf,

    /// Write shape-prefixed raw f32 files instead of quantizing.
    #[arg(long)]
    raw: bool,

    /// Rank of every tensor in the checkpoint (the raw format does not
    /// record it).
    #[arg(long, default_value_t = 2)]
    rank: usize,

    /// Tensor names to export, e.g. q_proj k_proj v_proj.
    #[arg(required = true)]
    tensors: Vec<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    std::fs::create_dir_all(&args.out)?;

    let provider = CheckpointDir::new(&args.checkpoint_dir, args.rank);
    let mode = if args.raw {
        ExportMode::Raw
    } else {
        ExportMode::Quantized
    };

    let mut failed = false;
    for (name, result) in export_all(&provider, &args.tensors, &args.out, mode) {
        match result {
            Ok(report) => println!("{report}"),
            Err(err) => {
                error!(tensor = name.as_str(), %err, "export failed");
                eprintln!("{name}: {err}");
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
