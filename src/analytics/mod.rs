pub mod gex;
