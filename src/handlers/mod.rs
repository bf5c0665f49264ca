pub mod products;
pub mod sync;
pub mod ws;
