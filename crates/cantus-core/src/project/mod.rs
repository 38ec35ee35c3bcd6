//! Project data model and phrase segmentation
//!
//! The editor owns and mutates a [`Project`] behind a project-wide lock
//! ([`SharedProject`]). The render core only reads it inside a short critical
//! section, turning voice parts into immutable [`Phrase`] snapshots that the
//! background render threads use without further locking.

mod error;
mod model;
mod phrase;

pub use error::PrepError;
pub use model::{
    Note, Part, Phoneme, Project, SharedProject, Track, VoicePart, WavePart,
    DEFAULT_RESOLUTION,
};
pub use phrase::{Phone, Phrase};
