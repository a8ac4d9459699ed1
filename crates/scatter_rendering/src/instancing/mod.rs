//! Instance storage and GPU data layouts.
//!
//! ## Key Concepts
//!
//! - **Capacity chunking**: storage grows in steps of [`CHUNK_SIZE`] instances
//! - **Sentinel tail**: slots past the active count hold NaN matrices
//! - **Indirect drawing**: [`DrawIndexedIndirectArgs`] per draw

mod buffer;
mod instance_data;

pub use buffer::{fill_sentinel, rounded_capacity, InstanceBuffers, CHUNK_SIZE};
pub use instance_data::{
    DrawIndexedIndirectArgs, InstanceTint, INSTANCE_DATA_SLOT, INSTANCE_MATRIX_SLOT,
};
