//! Dropbox path construction from folder and filename parameters.

use crate::records::PutFileRequest;

/// Join a folder and a filename into a Dropbox path.
///
/// An empty folder maps to the root; a trailing separator on the folder
/// is not duplicated.
pub fn build_path(folder: &str, filename: &str) -> String {
    if folder.is_empty() {
        format!("/{filename}")
    } else if folder.ends_with('/') {
        format!("{folder}{filename}")
    } else {
        format!("{folder}/{filename}")
    }
}

/// Resolve the destination path for an upload.
///
/// An explicit path in the request wins over the folder/filename
/// parameters; with no folder, the bare filename is used.
pub fn resolve_put_path(filename: &str, folder: &str, request: &PutFileRequest) -> String {
    if let Some(path) = request.path.as_deref() {
        if !path.is_empty() {
            return path.to_string();
        }
    }
    if !folder.is_empty() {
        return build_path(folder, filename);
    }
    filename.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_folder_yields_rooted_path() {
        assert_eq!(build_path("", "a.xml"), "/a.xml");
    }

    #[test]
    fn trailing_separator_is_not_duplicated() {
        assert_eq!(build_path("/f/", "a.xml"), "/f/a.xml");
    }

    #[test]
    fn missing_separator_is_inserted() {
        assert_eq!(build_path("/f", "a.xml"), "/f/a.xml");
        assert!(!build_path("/f", "a.xml").contains("//"));
    }

    #[test]
    fn explicit_request_path_wins() {
        let request = PutFileRequest {
            path: Some("/x/y.txt".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_put_path("a.xml", "/f", &request), "/x/y.txt");
    }

    #[test]
    fn empty_request_path_falls_back_to_folder() {
        let request = PutFileRequest {
            path: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(resolve_put_path("a.xml", "/f", &request), "/f/a.xml");
    }

    #[test]
    fn no_folder_yields_bare_filename() {
        let request = PutFileRequest::default();
        assert_eq!(resolve_put_path("a.xml", "", &request), "a.xml");
    }
}
