//! # ZombieRTS Development Tools
//!
//! Command-line helpers for working on the game data:
//! - Data validators
//! - Headless scripted sessions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod simulate;
pub mod validate;
