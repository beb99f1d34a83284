pub mod context;
pub mod logging;
pub mod models;
pub mod research;
