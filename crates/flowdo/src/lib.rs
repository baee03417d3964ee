pub mod actions;
pub mod ai;
pub mod app;
pub mod cache;
pub mod canvas_view;
pub mod config;
pub mod defaults;
pub mod effects;
pub mod expand;
pub mod importer;
pub mod minimap_view;
pub mod node_card;
pub mod panels;
pub mod persistence;
pub mod serialization;
pub mod state;
pub mod store;
pub mod versioned;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

pub use app::{FlowDoApp, create_app};
