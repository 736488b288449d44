//! Stable error codes and message templates for the Dropbox connector.
//!
//! Every failure that crosses the activity boundary carries one of these
//! codes together with a message resolved by positional substitution.

use connector_sdk::messages::format_positional;

/// Error loading the request and response schema for an activity.
pub const DROPBOX_CODE01: &str = "Dropbox01";
/// Error loading the schema for a selected object.
pub const DROPBOX_CODE02: &str = "Dropbox02";
/// Error downloading a file.
pub const DROPBOX_CODE03: &str = "Dropbox03";
/// Error uploading a file.
pub const DROPBOX_CODE04: &str = "Dropbox04";
/// Error listing objects in a folder.
pub const DROPBOX_CODE05: &str = "Dropbox05";
/// Error getting a selected file.
pub const DROPBOX_CODE06: &str = "Dropbox06";
/// Error creating a connection.
pub const DROPBOX_CODE07: &str = "Dropbox07";

fn template(code: &str) -> &'static str {
    match code {
        DROPBOX_CODE01 => "Error loading the request and response schema for activity {0}",
        DROPBOX_CODE02 => "Error loading the request and response schema for {0}",
        DROPBOX_CODE03 => "Error downloading {0}",
        DROPBOX_CODE04 => "Error uploading {0}",
        DROPBOX_CODE05 => "Error listing objects in {0}: {1}",
        DROPBOX_CODE06 => "Error getting {0}: {1}",
        DROPBOX_CODE07 => "Error creating connection: {0}",
        _ => "Unknown error code",
    }
}

/// Resolve a catalog code into a user-facing message.
pub fn message(code: &str, args: &[&str]) -> String {
    format_positional(template(code), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_message_carries_the_path() {
        assert_eq!(
            message(DROPBOX_CODE03, &["/folder/a.xml"]),
            "Error downloading /folder/a.xml"
        );
    }

    #[test]
    fn connection_message_carries_the_cause() {
        assert_eq!(
            message(DROPBOX_CODE07, &["invalid_access_token"]),
            "Error creating connection: invalid_access_token"
        );
    }
}
