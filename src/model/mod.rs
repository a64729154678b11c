pub mod cell;
pub mod chart;
pub mod config;
pub mod grid;
pub mod view;
pub mod workspace;

pub use cell::*;
pub use chart::*;
pub use config::*;
pub use grid::*;
pub use view::*;
pub use workspace::*;
