use std::fs;

use anyhow::Result;
use clap::Parser;

mod codegen;
mod commandline;
mod error;
mod listing;
mod optimiser;
mod symbols;
mod tac;

use commandline::{BackendOptions, Operation, Options};
use tac::TacProgram;

fn main() -> Result<()> {
    let options = Options::parse();
    stderrlog::new()
        .verbosity(options.verbose)
        .init()?;

    match options.operation {
        Operation::Compile {
            file,
            output,
            backend,
        } => {
            let program = load(&file, &backend)?;
            let assembly = codegen::compile(&program)?;
            match output {
                Some(path) => fs::write(path, assembly.to_string())?,
                None => print!("{}", assembly),
            }
        }
        Operation::Dump { file, backend } => {
            let program = load(&file, &backend)?;
            print!("{}", program.listing);
        }
    }

    Ok(())
}

fn load(file: &str, backend: &BackendOptions) -> Result<TacProgram> {
    let source = fs::read_to_string(file)?;
    let mut program = tac::parse(&source)?;
    if backend.optimise() {
        optimiser::optimise(&mut program.listing);
    }
    Ok(program)
}
