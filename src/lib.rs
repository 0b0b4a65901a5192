//! Sales opportunity dashboard.
//!
//! [`data`] loads, filters and aggregates the opportunity table,
//! [`dashboard`] turns it into per-page views, and [`app`] / [`ui`] draw
//! those views with egui.

pub mod app;
pub mod color;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod state;
pub mod ui;
