mod coordinator;
mod puzzle;

pub use coordinator::{
    AlarmSnapshot, PuzzleOutcome, RingState, TriggerCoordinator, DEFAULT_SNOOZE_MINUTES,
};
pub use puzzle::{Operator, PuzzleChallenge, PuzzleGate, OPERAND_MAX, OPERAND_MIN};
