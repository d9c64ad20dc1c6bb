//! Wire formats: the control-channel message framing and the per-chunk frame

pub mod codec;
pub mod frame;
pub mod messages;
pub mod ranges;
pub mod version;

pub use codec::ControlCodec;
pub use frame::ChunkFrame;
pub use messages::{ControlMessage, MessageKind};
pub use ranges::{compress_ranges, decompress_ranges};
pub use version::{negotiate_version, PROTOCOL_VERSION};
