pub mod config;
pub mod enigma2;
pub mod errors;
pub mod utils;
