pub mod blobs;
pub mod execution_block;
pub mod execution_payload;
pub mod fork;
pub mod forkchoice;
pub mod payload_attributes;
pub mod payload_status;
pub mod responses;
pub mod transition;
pub mod withdrawal;

/// A consensus-layer time unit during which one block may be proposed.
pub type Slot = u64;

pub type Epoch = u64;

/// Opaque 8-byte identifier for an in-progress payload build, issued by the
/// execution engine. Encoded as 0x-prefixed DATA on the wire.
pub type PayloadId = alloy_primitives::B64;
