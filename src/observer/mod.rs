// Observer system: fans completed mutations out to the activity log,
// in-app notifications and email, off the request path.

pub mod context;
pub mod error;
pub mod event;
pub mod implementations;
pub mod pipeline;
pub mod traits;

// Re-export core types
pub use context::*;
pub use error::*;
pub use event::{ActivityEvent, Actor};
pub use pipeline::*;
pub use traits::*;
