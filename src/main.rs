use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use memspy::{platform_walker, StackWalker};

#[derive(Parser)]
#[command(name = "memspy", version, about = "Capture symbolic call-stack snapshots")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture the current call stack and write one line per frame
    Snapshot {
        /// Number of innermost frames to hide
        #[arg(short, long, default_value_t = 0)]
        skip: usize,
        /// Write the trace to this file instead of stdout
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = do_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn do_main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Command::Snapshot { skip, file } => snapshot(skip, file.as_deref()),
    }
}

fn snapshot(skip: usize, file: Option<&Path>) -> Result<()> {
    let mut sink = open_trace_output(file)?;
    platform_walker().capture_trace(&mut *sink, skip);
    sink.flush().context("flush trace output")?;
    Ok(())
}

fn open_trace_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create trace file {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdout())),
    }
}

#[cfg(test)]
mod tests {
    use super::snapshot;

    #[test]
    fn test_snapshot_writes_a_trace_file() {
        let _ = env_logger::builder().is_test(true).try_init();

        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("trace.log");
        snapshot(0, Some(&path)).expect("snapshot failed");

        let contents = std::fs::read_to_string(&path).expect("failed to read trace file");
        if cfg!(target_os = "linux") {
            assert!(!contents.is_empty());
            for line in contents.lines() {
                assert_eq!(line.split_whitespace().count(), 3, "bad line {:?}", line);
            }
        } else {
            assert_eq!(contents, "? -1 -1");
        }
    }
}
