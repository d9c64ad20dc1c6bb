//! Manifest, chunking, session state, resume, and progress tracking

pub mod chunking;
pub mod manifest;
pub mod progress;
pub mod resume;
pub mod state_machine;

pub use chunking::{compute_manifest, read_chunk, ChunkOptions};
pub use manifest::{ChunkDescriptor, Manifest, TransferPolicy};
pub use progress::TransferProgress;
pub use resume::ResumeBitmap;
pub use state_machine::{Direction, SessionState, SessionStateMachine};
