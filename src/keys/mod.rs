//! Credential pools.
//!
//! Each provider gets one [`KeyPool`] built at startup. Requests draw a key
//! from it according to the configured [`RotationPolicy`]:
//! - `random`: independent uniform pick per request
//! - `round_robin`: insertion-order cycling through a shared atomic cursor

mod pool;

pub use pool::{KeyPool, RotationPolicy, KEY_DELIMITER};
