pub mod auth;
pub mod payments;
pub mod products;
pub mod stock;
pub mod sweeper;
