//! Background worker: drains the notification queue and prunes old rows.

pub mod cleanup;
pub mod poller;
