//! Path-finding synthesis over the API graph.
//!
//! Given a target type, [`PathFinder::find_api_path`] searches for a call
//! chain whose composed edge constraints admit a consistent type-variable
//! assignment, interleaving graph traversal with incremental constraint
//! solving and backtracking. The companions encode a resolved member's
//! admissible type sets for the external program generator and advise on
//! type-argument erasure.

mod encode;
mod erasure;
mod path;

pub use encode::{encode_api_components, ApiComponents};
pub use erasure::{can_elide_type_args, occurrences, Occurrence, ResolvedCall};
pub use path::{ApiPath, PathFinder, SelectionMode};
