use std::path::Path;

use csrun::runner::Runner;
use csrun::util::errors::{Result, RunFailure};

const USAGE: &str = "cs [command] [file]";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "run" => {
            let Some(file) = args.get(2) else {
                eprintln!("{USAGE}");
                std::process::exit(1);
            };
            run(Path::new(file))
        }
        "compile" => {
            eprintln!("Not implemented");
            std::process::exit(1);
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

fn run(file: &Path) -> Result<()> {
    match Runner::default().run_file(file) {
        Ok(()) => Ok(()),
        Err(RunFailure::Compile { diagnostics }) => {
            for diagnostic in diagnostics.iter().filter(|d| d.is_reportable()) {
                eprintln!("{diagnostic}");
            }
            std::process::exit(1);
        }
        Err(failure) => Err(failure.into()),
    }
}
