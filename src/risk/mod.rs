pub mod greeks;
pub mod limits;
pub mod pipeline;
pub mod probability;
