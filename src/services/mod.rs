pub mod model_service;
pub mod profile_service;
pub mod randomizer;
pub mod session_service;

pub use model_service::{ModelService, QuizGateway};
pub use profile_service::ProfileService;
pub use randomizer::QuestionRandomizer;
pub use session_service::SessionService;
