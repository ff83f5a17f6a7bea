//! Shared modules for the presence player.
//! The binary wires them to real hardware; tests drive them with fakes.

pub mod audio;
pub mod config;
pub mod daemon;
pub mod library;
pub mod player;
pub mod presence;
pub mod sensor;
