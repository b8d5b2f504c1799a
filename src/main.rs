//! `pdf-inspect`: a thin CLI driver over the reader core, printing a
//! document summary, info dictionary, pages dictionary, and the
//! resolved form of every in-use object.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pdf_nursery::{Nursery, Object};

#[derive(Parser, Debug)]
#[command(name = "pdf-inspect", about = "Inspect a PDF file's structure")]
struct Cli {
    /// Path to the PDF file to attach to.
    path: PathBuf,

    /// Increase log verbosity; repeat for more (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Skip resolving and printing every in-use object (on by default).
    #[arg(long)]
    no_dump_objects: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> pdf_nursery::Result<()> {
    let mut session = Nursery::attach(&cli.path)?;

    let header = session.get_header();
    println!("PDF-{}.{}", header.major, header.minor);

    let doc = session.get_document().clone();
    println!("pages: {}  size: {}x{}", doc.page_count, doc.width, doc.height);

    for (key, value) in session.get_info() {
        if let Some(text) = value.as_bytes() {
            println!("info[{}]: {}", String::from_utf8_lossy(key), String::from_utf8_lossy(text));
        }
    }

    println!("pages dict: {:?}", session.get_pages());

    if !cli.no_dump_objects {
        let mut refs = session.get_references();
        refs.sort_by_key(|r| (r.index, r.generation));
        for reference in refs {
            match session.resolve(reference) {
                Ok(Object::Stream(stream)) => {
                    println!("{} {} obj: stream, dict = {:?}", reference.index, reference.generation, stream.dict)
                }
                Ok(object) => println!("{} {} obj: {:?}", reference.index, reference.generation, object),
                Err(e) => log::warn!("object {} {} failed to resolve: {}", reference.index, reference.generation, e),
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
