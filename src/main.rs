use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser as ClapParser;

use rox::runtime::{Lox, EXIT_USAGE};

/// Tree-walking interpreter for the Lox language.
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script to run; omit it to start an interactive session
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli: Cli = match Cli::try_parse() {
        Ok(cli) => cli,

        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit();
        }

        Err(e) => {
            let _ = e.print();
            process::exit(EXIT_USAGE);
        }
    };

    let mut lox = Lox::new();

    match cli.script {
        Some(path) => {
            let code = lox.run_file(&path)?;
            if code != 0 {
                process::exit(code);
            }
        }

        None => lox.run_prompt()?,
    }

    Ok(())
}
