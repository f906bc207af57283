pub use serde_yaml::{from_value, to_value, Mapping, Value};

mod secrets;
pub use secrets::*;
mod sensitive;
pub use sensitive::*;
mod sources;
pub use sources::*;
mod util;
pub use util::*;
