mod accessor;
mod bytes;
pub mod layout;
mod local;
mod snapshot;

pub use accessor::MemoryAccessor;
pub use bytes::ByteBuffer;
pub use local::LocalMemory;
pub use snapshot::{SnapshotMemory, SnapshotMemoryBuilder};
