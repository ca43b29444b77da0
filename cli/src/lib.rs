pub mod config;
pub mod logging;
pub mod state;
pub mod views;
pub mod widgets;
