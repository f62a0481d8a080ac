#![forbid(unsafe_code)]

//! Core value types shared by the sashdock layout crates.

pub mod geometry;

pub use geometry::{Point, Rect};
