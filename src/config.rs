//! Locating the master password for a user.
//!
//! The core derivation pipeline has no file I/O of its own; this
//! module resolves `$HOME/.mpw` (or the platform-equivalent home
//! directory) and scans it for a line of the form
//! `<user_name>:<master_password>`, exactly as the original C front
//! end's `homedir()`/`strsep` did.

use std::fs;
use std::path::PathBuf;

use crate::error::{DerivationError, DerivationErrorKind};
use crate::secret::Secret;

/// Resolve the path to the `.mpw` configuration file in the user's home
/// directory.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mpw"))
}

/// Read the `.mpw` file at `path` and find the master password for
/// `user_name`.
///
/// Returns `Ok(None)` if the file exists but has no matching line, and
/// `Err` only if the file could not be read at all. A missing file is
/// not itself an error here — the caller decides whether to fall back
/// to an interactive prompt.
pub fn load_master_password(
    path: &std::path::Path,
    user_name: &str,
) -> Result<Option<Secret<String>>, DerivationError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(DerivationError::new(
                DerivationErrorKind::DerivationFailed,
                format!("couldn't open configuration file {}: {e}", path.display()),
            ))
        }
    };
    Ok(find_master_password(&contents, user_name))
}

/// Scan `.mpw`-formatted `contents` for the first line naming
/// `user_name`, splitting on the first `:` only (a master password may
/// itself contain colons).
pub fn find_master_password(contents: &str, user_name: &str) -> Option<Secret<String>> {
    for line in contents.lines() {
        let Some((name, password)) = line.split_once(':') else {
            continue;
        };
        if name == user_name {
            return Some(Secret::new(password.to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_matching_line() {
        let contents = "alice:hunter2\nbob:correct horse battery staple\n";
        let password = find_master_password(contents, "bob").unwrap();
        assert_eq!(&*password, "correct horse battery staple");
    }

    #[test]
    fn returns_none_for_an_unknown_user() {
        let contents = "alice:hunter2\n";
        assert!(find_master_password(contents, "carol").is_none());
    }

    #[test]
    fn keeps_colons_that_are_part_of_the_password() {
        let contents = "alice:pass:with:colons\n";
        let password = find_master_password(contents, "alice").unwrap();
        assert_eq!(&*password, "pass:with:colons");
    }

    #[test]
    fn ignores_malformed_lines_without_a_colon() {
        let contents = "not a valid line\nalice:hunter2\n";
        let password = find_master_password(contents, "alice").unwrap();
        assert_eq!(&*password, "hunter2");
    }
}
