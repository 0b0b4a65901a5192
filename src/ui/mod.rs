//! egui rendering. Reads [`crate::state::AppState`]; all numbers come from
//! the page views in [`crate::dashboard`].

pub mod panels;
pub mod plot;
