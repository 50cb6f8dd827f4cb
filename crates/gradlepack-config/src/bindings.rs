//! Service bindings: externally supplied, secret-bearing configuration.
//!
//! A binding is a directory containing a `type` file and one file per
//! secret. Bindings live under `$SERVICE_BINDING_ROOT`, or
//! `<platform>/bindings` when that variable is unset.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable naming the bindings root.
pub const SERVICE_BINDING_ROOT: &str = "SERVICE_BINDING_ROOT";

/// Resolves a logical secret file name to a path on disk.
pub trait SecretSource {
    /// Path of the secret named `file_name`, or `None` if this source does
    /// not carry it.
    fn secret_file_path(&self, file_name: &str) -> Option<PathBuf>;
}

/// One bound configuration bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub binding_type: String,
    pub path: PathBuf,
    secrets: BTreeSet<String>,
}

impl Binding {
    pub fn new<I, S>(name: &str, binding_type: &str, path: &Path, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_owned(),
            binding_type: binding_type.to_owned(),
            path: path.to_path_buf(),
            secrets: secrets.into_iter().map(Into::into).collect(),
        }
    }

    /// Read a binding from its directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed or has no `type`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let read_err = |source: std::io::Error| ConfigError::Read {
            path: path.display().to_string(),
            source,
        };

        let type_path = path.join("type");
        let binding_type = match std::fs::read_to_string(&type_path) {
            Ok(t) => t.trim().to_owned(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::MissingBindingType {
                    path: path.display().to_string(),
                })
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: type_path.display().to_string(),
                    source,
                })
            }
        };

        let mut secrets = BTreeSet::new();
        for entry in std::fs::read_dir(path).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            // Kubernetes projects secrets through hidden `..data` symlinks.
            if file_name == "type" || file_name == "provider" || file_name.starts_with('.') {
                continue;
            }
            if entry.path().is_file() {
                secrets.insert(file_name);
            }
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();

        Ok(Self {
            name,
            binding_type,
            path: path.to_path_buf(),
            secrets,
        })
    }

    /// Names of the secrets this binding carries.
    pub fn secret_names(&self) -> impl Iterator<Item = &str> {
        self.secrets.iter().map(String::as_str)
    }
}

impl SecretSource for Binding {
    fn secret_file_path(&self, file_name: &str) -> Option<PathBuf> {
        self.secrets
            .contains(file_name)
            .then(|| self.path.join(file_name))
    }
}

/// Locate the bindings root for a platform directory.
pub fn bindings_root(platform: &Path, environment: &HashMap<String, String>) -> PathBuf {
    environment
        .get(SERVICE_BINDING_ROOT)
        .filter(|v| !v.is_empty())
        .map_or_else(|| platform.join("bindings"), PathBuf::from)
}

/// Read every binding under `root`, sorted by name. A missing root yields none.
///
/// # Errors
/// Returns an error if `root` or any binding directory cannot be read.
pub fn discover(root: &Path) -> Result<Vec<Binding>, ConfigError> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: root.display().to_string(),
                source,
            })
        }
    };

    let mut bindings = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Read {
            path: root.display().to_string(),
            source,
        })?;
        let path = entry.path();
        let hidden = entry.file_name().to_str().is_some_and(|n| n.starts_with('.'));
        if path.is_dir() && !hidden {
            bindings.push(Binding::from_path(&path)?);
        }
    }
    bindings.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(bindings)
}

/// Return the single binding of `binding_type` (case-insensitive), if any.
///
/// # Errors
/// Returns an error if more than one binding has that type.
pub fn resolve_one<'a>(
    bindings: &'a [Binding],
    binding_type: &str,
) -> Result<Option<&'a Binding>, ConfigError> {
    let mut matching = bindings
        .iter()
        .filter(|b| b.binding_type.eq_ignore_ascii_case(binding_type));
    let first = matching.next();
    let rest = matching.count();
    if rest > 0 {
        return Err(ConfigError::MultipleBindings {
            binding_type: binding_type.to_owned(),
            count: rest + 1,
        });
    }
    Ok(first)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    fn write_binding(root: &Path, name: &str, binding_type: &str, secrets: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{binding_type}\n")).unwrap();
        for (file, content) in secrets {
            fs::write(dir.join(file), content).unwrap();
        }
    }

    #[test]
    fn secret_file_path_only_for_known_secrets() {
        let binding = Binding::new(
            "some-gradle",
            "gradle",
            Path::new("/bindings/some-gradle"),
            ["gradle.properties"],
        );
        assert_eq!(
            binding.secret_file_path("gradle.properties"),
            Some(PathBuf::from("/bindings/some-gradle/gradle.properties"))
        );
        assert_eq!(binding.secret_file_path("gradle-wrapper.properties"), None);
    }

    #[test]
    fn discover_reads_type_and_secrets() {
        let tmp = tempfile::tempdir().unwrap();
        write_binding(
            tmp.path(),
            "some-gradle",
            "gradle",
            &[("gradle.properties", "a=b"), ("provider", "acme")],
        );
        write_binding(tmp.path(), "a-wrapper", "gradle-wrapper", &[]);

        let bindings = discover(tmp.path()).unwrap();

        assert_eq!(bindings.len(), 2);
        let first = bindings.first().unwrap();
        assert_eq!(first.name, "a-wrapper");
        assert_eq!(first.binding_type, "gradle-wrapper");
        let second = bindings.get(1).unwrap();
        assert_eq!(second.binding_type, "gradle");
        assert_eq!(second.secret_names().collect::<Vec<_>>(), vec!["gradle.properties"]);
    }

    #[test]
    fn discover_missing_root_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover(&tmp.path().join("bindings")).unwrap().is_empty());
    }

    #[test]
    fn discover_requires_type() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("broken")).unwrap();
        let err = discover(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("no type"));
    }

    #[test]
    fn bindings_root_prefers_env() {
        let mut env = HashMap::new();
        assert_eq!(
            bindings_root(Path::new("/platform"), &env),
            PathBuf::from("/platform/bindings")
        );
        env.insert(SERVICE_BINDING_ROOT.to_owned(), "/custom".to_owned());
        assert_eq!(
            bindings_root(Path::new("/platform"), &env),
            PathBuf::from("/custom")
        );
    }

    #[test]
    fn resolve_one_none_one_many() {
        let gradle = Binding::new("a", "gradle", Path::new("/a"), Vec::<String>::new());
        let wrapper = Binding::new("b", "Gradle-Wrapper", Path::new("/b"), Vec::<String>::new());
        let bindings = vec![gradle.clone(), wrapper];

        assert_eq!(resolve_one(&bindings, "maven").unwrap(), None);
        assert_eq!(resolve_one(&bindings, "gradle").unwrap(), Some(&gradle));
        assert!(resolve_one(&bindings, "gradle-wrapper").unwrap().is_some());

        let doubled = vec![gradle.clone(), gradle];
        let err = resolve_one(&doubled, "gradle").unwrap_err();
        assert!(err.to_string().contains("found 2 bindings of type gradle"));
    }
}
