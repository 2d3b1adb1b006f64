pub mod env;
pub mod value;

pub use env::*;
pub use value::*;
