//! CLI command handlers, one file per command.

mod add;
mod cancel;
mod remove;
mod run;
mod settings;
mod status;

pub use add::run_add;
pub use cancel::run_cancel;
pub use remove::run_remove;
pub use run::run_worker;
pub use settings::run_settings;
pub use status::run_status;
