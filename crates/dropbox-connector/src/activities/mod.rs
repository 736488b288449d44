//! The four activities the Dropbox connector registers with the host.

mod fetch;
mod get;
mod process;
mod put;

pub use fetch::FetchFileActivity;
pub use get::GetFileActivity;
pub use process::ProcessFileActivity;
pub use put::PutFileActivity;

/// Function parameter naming the source/destination folder.
pub const PARAM_FOLDER: &str = "folder";
/// Function parameter naming the file to operate on.
pub const PARAM_FILE_NAME: &str = "fileName";
/// Function parameter carrying the selected list object as JSON.
pub const PARAM_LIST_OBJECT: &str = "list-object";
