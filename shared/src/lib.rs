pub mod corridor;
pub mod events;
pub mod galaxy;

pub use corridor::{CorridorKind, CorridorStyle, classify};
pub use events::*;
pub use galaxy::*;
