#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod audit;
pub mod backfill;
pub mod models;
pub mod store;

pub use crate::audit::*;
pub use crate::backfill::*;
pub use crate::models::*;
pub use crate::store::*;
