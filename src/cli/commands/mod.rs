//! Subcommands of the `ttt5` binary

pub mod evaluate;
pub mod inspect;
pub mod play;
pub mod train;
