//! Transit map builder.
//!
//! Turns free-text per-line station lists into a geocoded dataset of lines
//! and stations, and serves that dataset as an interactive map.

pub mod dataset;
pub mod domain;
pub mod lines;
pub mod pipeline;
pub mod stations;
pub mod web;
