//! First-order Markov chain text generation library.
//!
//! This crate provides:
//! - A line tokenizer splitting words from trailing punctuation
//! - A token graph with counted edges and descending selection thresholds
//! - Background multi-source ingestion with progress and cancellation
//! - Line-based and structured (JSON) persistence with an optional
//!   compression envelope
//! - A weighted random-walk generator
//!
//! Typical flow: ingest sources, finalize, then walk.
//!
//! ```no_run
//! use rs_markov_core::{CancelFlag, Chain, Generator, WalkInput};
//!
//! let mut chain = Chain::new();
//! chain.ingest_text("The cat sat on the mat.", &CancelFlag::new());
//! chain.finalize();
//!
//! let input = WalkInput::new(20).unwrap();
//! let text = Generator::new(&input).generate(&chain, &input).unwrap();
//! println!("{text}");
//! ```

/// Shared cancellation flag checked once per ingested token.
pub mod cancel;

/// Error type and result alias.
pub mod error;

/// Background ingestion of several text sources.
///
/// Streams sources line by line, reports progress over a channel and
/// finalizes the chain once all sources are merged.
pub mod ingest;

/// File helpers (atomic writes, input listing).
pub mod io;

/// Chain, nodes, edges and the generator.
pub mod model;

/// Line-based and structured chain formats.
pub mod serializer;

/// Text preparation before ingestion.
pub mod text;

/// Word and punctuation tokenizer.
pub mod tokenizer;

pub use cancel::CancelFlag;
pub use error::{Error, Result};
pub use ingest::{IngestEvent, IngestHandle, IngestOptions, IngestReport, Source};
pub use model::NodeId;
pub use model::chain::{Chain, Ingested};
pub use model::edge::Edge;
pub use model::generator::{Emitted, Generator, render};
pub use model::node::Node;
pub use model::walk_input::WalkInput;
pub use serializer::Format;
