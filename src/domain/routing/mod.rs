//! Model routing domain
//!
//! Intent classification, the model catalog and the selection policy the
//! router applies before invoking a provider.

mod classifier;
mod decision;
mod intent;
mod model;
mod selection;

pub use classifier::{IntentClassifier, RuleBasedClassifier};
pub use decision::{RoutingDecision, RoutingReason};
pub use intent::IntentTag;
pub use model::ModelDescriptor;
pub use selection::{select_models, DEFAULT_BUDGET_FLOOR_FRACTION};
