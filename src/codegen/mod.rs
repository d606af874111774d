//! Target code generation.

mod mips;

pub use mips::{compile, Assembly};
