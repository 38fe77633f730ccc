//! Arithmetic dismissal gate.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OPERAND_MIN: i64 = 10;
pub const OPERAND_MAX: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleChallenge {
    pub operand_a: i64,
    pub operand_b: i64,
    pub operator: Operator,
    pub expected_answer: i64,
}

impl PuzzleChallenge {
    /// Build a challenge. Subtraction operands are ordered so the answer is
    /// never negative.
    pub fn new(a: i64, b: i64, operator: Operator) -> Self {
        let (operand_a, operand_b, expected_answer) = match operator {
            Operator::Add => (a, b, a + b),
            Operator::Subtract => {
                let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
                (hi, lo, hi - lo)
            }
        };
        Self {
            operand_a,
            operand_b,
            operator,
            expected_answer,
        }
    }

    pub fn prompt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PuzzleChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} = ?",
            self.operand_a,
            self.operator.symbol(),
            self.operand_b
        )
    }
}

/// Generates challenges from a PCG stream.
#[derive(Debug, Clone)]
pub struct PuzzleGate {
    rng: Pcg64,
}

impl PuzzleGate {
    pub fn new() -> Self {
        Self {
            rng: Pcg64::from_entropy(),
        }
    }

    /// Reproducible challenge sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> PuzzleChallenge {
        let a = self.rng.gen_range(OPERAND_MIN..=OPERAND_MAX);
        let b = self.rng.gen_range(OPERAND_MIN..=OPERAND_MAX);
        let operator = if self.rng.gen_bool(0.5) {
            Operator::Add
        } else {
            Operator::Subtract
        };
        PuzzleChallenge::new(a, b, operator)
    }

    /// True iff `submitted` parses as the expected integer.
    pub fn check(challenge: &PuzzleChallenge, submitted: &str) -> bool {
        submitted
            .trim()
            .parse::<i64>()
            .is_ok_and(|answer| answer == challenge.expected_answer)
    }
}

impl Default for PuzzleGate {
    fn default() -> Self {
        Self::new()
    }
}
