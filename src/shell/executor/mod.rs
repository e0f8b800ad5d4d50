mod builtin;
mod executor;
mod redirect;

pub use executor::{Executor, Flow};
