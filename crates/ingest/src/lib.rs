//! Inbound order ingestion.
//!
//! The wire schema for order messages, the translation into the domain
//! `Order`, and a worker-pool consumer fed from a bounded channel of raw
//! payloads. The channel is the seam to the external delivery collaborator:
//! it pushes at-least-once, and anything the pipeline cannot process lands
//! on the dead-letter side of the seam.

mod consumer;
mod message;

pub use consumer::{Consumer, DeadLetter, DeliveryOutcome};
pub use message::{OrderItemMessage, OrderMessage, order_from_message};
