pub mod attempt;
pub mod profile;
pub mod question;
pub mod session;

pub use attempt::{AttemptRecord, AttemptResult};
pub use profile::{Badge, BadgeRarity, UserProfile};
pub use question::{Difficulty, Question};
pub use session::{QuizSession, SessionPhase};
