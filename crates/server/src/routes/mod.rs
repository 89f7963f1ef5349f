pub mod health;
pub mod sprints;
pub mod ws;

pub use health::*;
pub use sprints::*;
pub use ws::*;
