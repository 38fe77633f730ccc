use std::io::{self, BufRead, Write};

use clap::Args;
use wakeroom_core::PuzzleGate;

#[derive(Args)]
pub struct PuzzleArgs {
    /// Seed for a reproducible challenge
    #[arg(long)]
    seed: Option<u64>,
    /// Check this answer instead of reading one from stdin
    #[arg(long)]
    answer: Option<String>,
}

pub fn run(args: PuzzleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut gate = match args.seed {
        Some(seed) => PuzzleGate::with_seed(seed),
        None => PuzzleGate::new(),
    };
    let challenge = gate.generate();
    println!("{challenge}");

    let answer = match args.answer {
        Some(answer) => answer,
        None => {
            print!("> ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line
        }
    };

    if PuzzleGate::check(&challenge, &answer) {
        println!("correct");
        Ok(())
    } else {
        Err(format!("incorrect, the answer was {}", challenge.expected_answer).into())
    }
}
