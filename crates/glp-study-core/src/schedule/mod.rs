//! Schedule resolution for study tests.
//!
//! Pipeline: collaborator date strings → Normalization → Due dates → Status

mod dates;
mod resolver;

pub use dates::*;
pub use resolver::*;
