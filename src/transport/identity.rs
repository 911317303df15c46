//! Identity issuer
//!
//! Hands out publisher (`P1`, `P2`, …) and subscriber (`S1`, `S2`, …)
//! identifiers. One issuer is shared by every connection of a server so that
//! identifiers stay unique for the lifetime of the process. The broker trusts
//! these identifiers and never generates its own.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct IdentityIssuer {
    next_publisher: AtomicU64,
    next_subscriber: AtomicU64,
}

impl Default for IdentityIssuer {
    fn default() -> Self {
        Self {
            next_publisher: AtomicU64::new(1),
            next_subscriber: AtomicU64::new(1),
        }
    }
}

impl IdentityIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publisher(&self) -> String {
        format!("P{}", self.next_publisher.fetch_add(1, Ordering::Relaxed))
    }

    pub fn subscriber(&self) -> String {
        format!("S{}", self.next_subscriber.fetch_add(1, Ordering::Relaxed))
    }
}
