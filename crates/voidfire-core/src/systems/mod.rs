//! Systems - stateful subsystems driven once per frame by the engine

mod events;
mod weapon;
mod projectile;
mod status;
mod synergy;
mod balance;

pub use events::*;
pub use weapon::*;
pub use projectile::*;
pub use status::*;
pub use synergy::*;
pub use balance::*;
