//! # mathdrill-algo - adaptive practice core algorithms
//!
//! Pure Rust implementations of the selection and adaptation heuristics used
//! by the mathdrill backend:
//!
//! - **Question allocation** - largest-remainder split of a session across
//!   micro-skills
//! - **Difficulty adaptation** - threshold-driven difficulty stepping on a
//!   1-10 scale
//! - **Confidence scoring** - correctness + relative speed mapped to 0-100
//! - **Fatigue detection** - early-vs-late session performance comparison
//!
//! Everything in this crate is deterministic and side-effect free: same
//! inputs, same outputs. Persistence, randomness, and I/O live in the
//! backend crate.

pub mod allocator;
pub mod confidence;
pub mod difficulty;
pub mod fatigue;
pub mod interleave;
pub mod types;
pub mod window;

pub use allocator::{allocate, AllocationError, SkillAllocation};
pub use confidence::{confidence_score, ConfidenceBucket};
pub use difficulty::{next_difficulty, AdaptationConfig};
pub use fatigue::{analyze_pacing, AnswerSample, PacingReport};
pub use interleave::interleave;
pub use types::{clamp_difficulty, MAX_DIFFICULTY, MIN_DIFFICULTY, ROLLING_WINDOW_SIZE};
pub use window::AttemptWindow;
