//! Website generation
//!
//! Chunk-level generation, bounded fan-out, reply reassembly and the
//! end-to-end pipeline in both its chunked and structural forms.

mod assembler;
mod chunk;
mod dispatch;
mod pipeline;
mod sections;
mod structure;

pub use assembler::{KindBuffers, SectionAssembler};
pub use chunk::{ChunkGenerator, ModelSet};
pub use dispatch::ParallelDispatcher;
pub use pipeline::GenerationPipeline;
pub use sections::SectionSplitter;
pub use structure::{StructureAnalyzer, StructureSummary};
