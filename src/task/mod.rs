//! Background tasks.

pub mod update_poller;
