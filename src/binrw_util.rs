//! This module contains utility types for the binrw crate.

pub mod helpers;

pub mod prelude {
    pub use super::helpers::*;
}
