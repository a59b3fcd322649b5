//! Streamed response handling
//!
//! Wire types for response chunks and the accumulator that turns them into
//! one message per turn.

mod accumulator;
mod chunk;

pub use accumulator::{AccumulatedMessage, StreamAccumulator, StreamUpdate};
pub use chunk::{ChunkState, Source, StreamChunk};
