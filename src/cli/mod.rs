pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use self::commands::{dump, generate};

#[derive(Parser)]
#[command(name = "ebmlgen")]
#[command(about = "EBML schema-driven decoder generator", version, author)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the streaming decoder module from an EBML schema
    Generate {
        /// The EBML schema document (XML)
        #[arg(default_value = "schema.xml")]
        schema: PathBuf,

        /// Module name, used for the output file and its banner
        #[arg(short, long, default_value = "ebml_decoder")]
        name: String,

        /// The output file (defaults to build/<name>.rs)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode an EBML document with the built-in schema and print its tree
    Dump {
        /// The EBML document to decode
        #[arg(required = true)]
        input: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            schema,
            name,
            output,
        } => generate::execute(schema, name, output),
        Commands::Dump { input } => dump::execute(input),
    }
}
