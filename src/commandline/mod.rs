use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(about = "A TAC-to-MIPS compiler back end")]
pub struct Options {
    #[clap(subcommand)]
    pub operation: Operation,
    #[clap(short, long, default_value_t = 1)]
    pub verbose: usize,
}

#[derive(Debug, Subcommand)]
pub enum Operation {
    /// Compile a TAC listing to assembly
    Compile {
        file: String,
        /// Write the assembly here instead of stdout
        #[clap(short, long)]
        output: Option<String>,
        #[clap(flatten)]
        backend: BackendOptions,
    },
    /// Parse and optimise a TAC listing, then dump it
    Dump {
        file: String,
        #[clap(flatten)]
        backend: BackendOptions,
    },
}

#[derive(Debug, Args)]
pub struct BackendOptions {
    #[clap(short, long)]
    /// Do not optimise the TAC listing
    no_optimise: bool,
}

impl BackendOptions {
    pub fn optimise(&self) -> bool {
        !self.no_optimise
    }
}
