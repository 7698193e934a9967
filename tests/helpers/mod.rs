pub mod app;
pub mod forecast_server;
