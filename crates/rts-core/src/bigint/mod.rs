pub mod mp;
pub mod ops;

pub use mp::{MpDigit, MpInt, MpSign};
pub use ops::*;
