use cfront::ast::{ExternalDecl, TranslationUnit};
use cfront::err::IOErr;
use cfront::parse_source;

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// C source file to parse. Must already be preprocessed.
    file: PathBuf,

    /// Print the whole syntax tree instead of a summary.
    #[clap(long)]
    dump_ast: bool,

    /// Log more; repeat for more detail (`-vv` traces every token).
    #[clap(short, long, parse(from_occurrences))]
    verbose: u64,
}

fn init_logging(verbose: u64) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_summary(unit: &TranslationUnit) {
    for ext in &unit.decls {
        match ext {
            ExternalDecl::Function(f) => println!("{}: function {}: {}", f.pos, f.name, f.ty),
            ExternalDecl::Declaration(group) if group.decls.is_empty() => println!("{}: {}", group.pos, group.base),
            ExternalDecl::Declaration(group) => {
                for decl in &group.decls {
                    let what = if decl.is_typedef { "typedef" } else { "declaration" };
                    println!("{}: {} {}: {}", decl.pos, what, decl.name, decl.ty);
                }
            },
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let body = match std::fs::read_to_string(&args.file) {
        Ok(body) => body,
        Err(source) => {
            eprintln!("{}", IOErr::Read { path: Some(args.file.clone()), source });
            process::exit(2);
        },
    };
    let filename = args.file.to_string_lossy();

    match parse_source(&body, Some(&filename)) {
        Ok(unit) => {
            log::info!("{} top-level declarations", unit.decls.len());
            if args.dump_ast {
                println!("{:#?}", unit);
            } else {
                print_summary(&unit);
            }
        },
        Err(err) => {
            if err.report_single(&body).is_err() {
                eprintln!("{}", err);
            }
            process::exit(1);
        },
    }
}
