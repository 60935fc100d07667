mod contact;
mod detector;

pub use self::contact::{ContactRecord, ContactStatus};
pub use self::detector::{dedupe_contacts, find_collisions};
