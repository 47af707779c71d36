pub mod performance;
pub mod readings;
pub mod system;
pub mod types;

pub use performance::*;
pub use readings::*;
pub use system::*;
pub use types::*;
