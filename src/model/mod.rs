mod edge;
mod item;

pub use edge::*;
pub use item::*;
