mod ping;
mod stats;

pub use ping::*;
pub use stats::*;
