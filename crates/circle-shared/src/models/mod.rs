mod account;
mod audit;
mod friendship;
mod profile;

pub use account::*;
pub use audit::*;
pub use friendship::*;
pub use profile::*;
