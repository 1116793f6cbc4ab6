//! SQuAD-format corpus access for `qa-span-features`.
//!
//! [`SquadDataset`] locates `<split>-<task>/<split>-<task>.json` under a data
//! directory, [`SquadReader`] turns the JSON into
//! [`RawExample`](qa_span_features::RawExample)s and [`JsonLinesSink`]
//! streams converted features to disk.

mod error;
mod reader;
mod sink;

pub use error::{CorpusError, Result};
pub use reader::{SquadDataset, SquadReader, SquadSplit};
pub use sink::{read_features, JsonLinesSink};
