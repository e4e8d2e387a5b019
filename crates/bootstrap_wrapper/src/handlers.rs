//! Handlers shipped with the wrapper: the reference echo handler and the
//! entry-point function packaged as the integration deployment artifact.

pub mod echo;
pub mod entry_points;
pub mod https;
