//! Paged delivery of output to a message channel.
//!
//! [`send_interactive`] streams pages one at a time and waits for the
//! invoking author to ask for more between pages.

mod interactive;

pub use interactive::{DEFAULT_ACK, DeliveryOptions, add_ack, remaining_prompt, send_interactive};
