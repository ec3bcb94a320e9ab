//! Packed per-edge turn order slots
//!
//! Every (edge, endpoint) pair at a vertex with a turn table gets an order
//! in `0..=14`. Both endpoint orders of an edge share one byte: the tail order
//! plus one in the low nibble, the head order plus one in the high nibble,
//! zero meaning no order assigned.

/// Number of order slots available at one vertex.
pub const MAX_ORDERS: usize = 15;

pub fn pack(tail: Option<u8>, head: Option<u8>) -> u8 {
    nibble(tail) | (nibble(head) << 4)
}

pub fn unpack(packed: u8) -> (Option<u8>, Option<u8>) {
    (order(packed & 0x0F), order(packed >> 4))
}

fn nibble(order: Option<u8>) -> u8 {
    match order {
        Some(o) => {
            debug_assert!((o as usize) < MAX_ORDERS, "turn order {o} out of range");
            (o & 0x0F) + 1
        }
        None => 0,
    }
}

fn order(nibble: u8) -> Option<u8> {
    if nibble == 0 {
        None
    } else {
        Some(nibble - 1)
    }
}
