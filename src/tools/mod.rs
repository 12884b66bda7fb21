pub mod registry;
pub mod sum;
