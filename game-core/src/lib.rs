pub mod cleanup;
pub mod error;
pub mod game_state;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod word_validation;

// Re-export main components
pub use cleanup::*;
pub use error::*;
pub use game_state::*;
pub use scoring::*;
pub use session::*;
pub use word_validation::*;
