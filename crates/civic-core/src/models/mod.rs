mod from_row;
mod gender;
mod structs;

pub use gender::{ends_with_gender_letter, has_gender_suffix, GenderToken};
pub use structs::UserRecord;
