mod roster;
mod roster_command;
mod roster_handle;

pub use roster::*;
pub use roster_command::*;
pub use roster_handle::*;
