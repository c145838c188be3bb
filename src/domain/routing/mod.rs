//! Query routing: the fixed category taxonomy and the keyword fallback

mod category;
mod config;
mod decision;
mod heuristic;

pub use category::RouteCategory;
pub use config::RouterConfig;
pub use decision::{DecisionSource, RouteDecision};
pub use heuristic::KeywordHeuristic;
