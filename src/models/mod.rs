mod license;
mod tenant;

pub use license::*;
pub use tenant::*;
