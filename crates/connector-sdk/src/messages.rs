//! Positional message templating for error catalogs.
//!
//! Connector message catalogs map stable codes to templates with
//! positional placeholders (`{0}`, `{1}`, ...) that are resolved with
//! per-failure context such as the attempted path.

/// Resolve positional placeholders in a message template.
///
/// Placeholders beyond the supplied arguments are left untouched.
pub fn format_positional(template: &str, args: &[&str]) -> String {
    let mut message = template.to_string();
    for (index, arg) in args.iter().enumerate() {
        message = message.replace(&format!("{{{index}}}"), arg);
    }
    message
}
