//! vsi - assemble scraped chapters into an EPUB

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vsi::{ConvertOptions, convert_folder};

#[derive(Parser)]
#[command(name = "vsi")]
#[command(version, about = "Assemble scraped chapters into an EPUB", long_about = None)]
#[command(after_help = "EXAMPLES:
    vsi ./memory memory.epub Memory \"Jonathan K. Foster\"

Set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity.")]
struct Cli {
    /// Folder holding the chapter `*.html` files and their `_files/` folders
    #[arg(value_name = "INPUT_FOLDER")]
    input_folder: PathBuf,

    /// EPUB file to write
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Book title; the series subtitle is appended
    #[arg(value_name = "TITLE")]
    title: String,

    /// Book author
    #[arg(value_name = "AUTHOR")]
    author: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match convert_folder(
        &cli.input_folder,
        &cli.output,
        &cli.title,
        &cli.author,
        &ConvertOptions::default(),
    ) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}
