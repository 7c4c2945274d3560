//! API handlers organized by resource.

mod accounts;
mod images;
mod posts;
mod status;

pub use accounts::*;
pub use images::*;
pub use posts::*;
pub use status::*;
