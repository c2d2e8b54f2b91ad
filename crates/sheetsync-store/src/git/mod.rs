//! Git-backed snapshot store

mod command;
mod working_copy;

pub use command::{git_available, Git, Identity};
pub use working_copy::{repo_name_from_url, GitWorkingCopy, StoreConfig};
