mod accounts;
mod error;
mod friendships;
mod pagination;
mod profiles;
mod query;
mod validation;

pub use accounts::*;
pub use error::*;
pub use friendships::*;
pub use pagination::*;
pub use profiles::*;
pub use query::*;
pub use validation::*;
