pub mod assist;
pub mod chart_ops;
pub mod export;
pub mod navigate;
pub mod panels;
pub mod progress;
pub mod session;
pub mod validate;
