pub mod aggressiveness;
pub mod error;
pub mod letter;
pub mod predictor;
pub mod prefix_tree;
pub mod sublanguage;
pub mod word_stats;

pub use aggressiveness::AggressivenessController;
pub use error::{EngineError, TreeError};
pub use predictor::{PredictionEngine, Predictions, WordOutcome};
pub use prefix_tree::{PrefixTree, word_is_valid};
