//! Game entities.
//!
//! Players are steered by their sessions; food is static until eaten.

mod food;
mod player;

pub use food::{Food, FoodId};
pub use player::{Player, PlayerId};
