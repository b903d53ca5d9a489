//! Service wiring for the taskhub binary, exposed so an HTTP or RPC
//! front end can embed the same graph.

pub mod app;

pub use app::App;
