//! Contact form messages and the owner notification.

mod mailer;
mod repository;

pub use mailer::{ContactMailer, CONTACT_SUBJECT};
pub use repository::{Contact, ContactRepository, ContactSort, ContactUpdate, NewContact};
