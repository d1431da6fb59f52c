pub mod command;
pub mod dispatch;
pub mod scanner;

pub use command::{parse_command_block, Command};
pub use dispatch::{dispatch, DispatchConfig, DispatchResult, SubstitutionTable};
pub use scanner::{Frame, FrameScanner};
