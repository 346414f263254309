//! Team draw logic: ordering, snake allocation, the draw engine, and the draw lifecycle.

mod allocation;
mod engine;
mod lifecycle;
mod ordering;

pub use allocation::allocate;
pub use engine::{draw, DrawShape};
pub use lifecycle::DrawLifecycleManager;
pub use ordering::order_players;
