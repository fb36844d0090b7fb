// src/config/mod.rs
pub mod refresher;

pub use refresher::{load_default, load_from, RefresherConfig};
