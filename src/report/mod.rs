//! Report rendering.

pub mod generator;

pub use generator::{render_chart, render_report};
