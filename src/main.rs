use anyhow::Context as _;
use clap::Parser;
use lexalr::grammar::Grammar;
use lexalr::lr::{self, ParseTable};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print every LALR(1) state with its items, actions, and gotos.
    #[arg(long)]
    dump_states: bool,

    /// Parse this whitespace-separated sequence of terminal names.
    #[arg(short, long)]
    input: Option<String>,

    /// The path of the grammar definition file.
    grammar: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    let text = fs::read_to_string(&args.grammar)
        .with_context(|| format!("failed to read {}", args.grammar.display()))?;
    let grammar = Grammar::parse(&text).context("failed to parse the grammar definition")?;
    println!("{}", grammar);

    let table = ParseTable::build(&grammar);
    println!("{} LALR(1) states", table.len());
    for conflict in table.conflicts() {
        println!("warning: {}", conflict);
    }
    if args.dump_states {
        println!("{}", table.display());
    }

    if let Some(input) = &args.input {
        let parser = lr::Parser::new(&table);
        let accepted = parser.parse(input.split_whitespace());
        println!(
            "input {}",
            if accepted { "accepted" } else { "rejected" }
        );
    }

    Ok(())
}
