//! Request handlers.

pub mod health;
pub mod storyboard;
pub mod translate;

pub use health::*;
pub use storyboard::*;
pub use translate::*;
