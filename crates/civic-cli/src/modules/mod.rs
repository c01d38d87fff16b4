pub(crate) mod audit;
pub(crate) mod backfill;
pub(crate) mod system;
