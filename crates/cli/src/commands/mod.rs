pub mod check;
pub mod settings;

pub use check::*;
pub use settings::*;
