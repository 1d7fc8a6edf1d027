use relative_path::{RelativePath, RelativePathBuf};
use std::fmt;
use std::path::{Path, PathBuf};

/* 📖 # Why use RelativePathBuf for FilePath?

FilePath wraps RelativePathBuf so that every path handed to the PAL is relative
to the PAL's base directory (the working directory for the CLI, a temp dir in
tests, nothing at all for MockPal). Absolute system paths cannot sneak in.
*/

/// Type-safe wrapper for file paths relative to the PAL base directory.
///
/// ```
/// use portfolio_base::FilePath;
///
/// let config = FilePath::from("portfolio.toml");
/// assert_eq!(config.to_string(), "portfolio.toml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Resolve against a base directory for use with std::fs.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        self.0.to_path(base)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_path_joins_base() {
        let path = FilePath::from("conf/portfolio.toml");
        assert_eq!(
            path.to_path(Path::new("/srv/app")),
            PathBuf::from("/srv/app/conf/portfolio.toml")
        );
    }

    #[test]
    fn test_equality_across_constructors() {
        assert_eq!(
            FilePath::from("portfolio.toml"),
            FilePath::from(String::from("portfolio.toml"))
        );
    }
}
