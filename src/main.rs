use std::io::{self, BufRead};

use anyhow::{Context, Result};
use clap::Parser;

use seqre::{split_words, word, word_ignore_case};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pattern over whitespace-separated words, e.g. "<the> (<big>|<small>) <dog>"
    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Compare words ignoring ASCII case
    #[arg(short = 'i', long)]
    ignore_case: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let regex = if args.ignore_case {
        word_ignore_case(&args.pattern)
    } else {
        word(&args.pattern)
    }
    .with_context(|| format!("failed to compile pattern {:?}", args.pattern))?;

    println!("regex: {regex}");
    println!();

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        let tokens = split_words(&line);
        println!("contains: {}", regex.is_match(&tokens));
        println!("matches:  {}", regex.matches(&tokens));
        println!();
    }

    Ok(())
}
