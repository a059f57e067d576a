pub mod exaone;
pub mod model;
