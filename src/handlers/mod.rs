pub mod health_handler;
pub mod profile_handler;
pub mod quiz_handler;
pub mod session_handler;
pub mod updates_handler;

pub use health_handler::health_check;
pub use profile_handler::{
    available_badges, badge_count, get_badges, get_profile, leaderboard, quiz_stats,
    record_attempt, topic_leaderboard,
};
pub use quiz_handler::{ai_tutor, generate_quiz, grade_answer};
pub use session_handler::{
    abandon_session, advance_session, current_session, select_option, session_result,
    start_session, submit_answer,
};
pub use updates_handler::dashboard_updates;
