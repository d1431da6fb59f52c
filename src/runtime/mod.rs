pub mod context;
pub mod frontend;
pub mod r#loop;
pub mod mode;
pub mod update;

pub use context::{RuntimeContext, SessionRequest};
pub use r#loop::Runtime;
pub use mode::RuntimeMode;
pub use update::{OutputChannel, UiUpdate};
