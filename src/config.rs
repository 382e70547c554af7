use crate::template::{CommandTemplate, TemplateError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// Name of the per-directory configuration fragment.
pub const FRAGMENT_FILE: &str = "config_supporter.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("can not stat {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("can not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("can not parse {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("bad {field} template: {source}")]
    Template {
        field: &'static str,
        source: TemplateError,
    },
    #[error("can not determine the home directory")]
    NoHomeDir,
}

/// One directory's worth of settings, as written in `config_supporter.toml`.
/// Keys that are absent stay `None` and never override anything.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest_template: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_debug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_opt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pbcopy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_id: Option<String>,
}

impl ConfigFragment {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decode = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let text = std::str::from_utf8(&bytes).map_err(|e| decode(e.into()))?;
        toml::from_str(text).map_err(|e| decode(e.into()))
    }

    /// Overlays `other` on top of `self`: every key `other` sets wins.
    pub fn merge(&mut self, other: ConfigFragment) {
        fn overlay<T>(dst: &mut Option<T>, src: Option<T>) {
            if src.is_some() {
                *dst = src;
            }
        }

        overlay(&mut self.template_src, other.template_src);
        overlay(&mut self.contest_template, other.contest_template);
        overlay(&mut self.compile_debug, other.compile_debug);
        overlay(&mut self.compile_opt, other.compile_opt);
        overlay(&mut self.bundle_source, other.bundle_source);
        overlay(&mut self.pbcopy, other.pbcopy);
        overlay(&mut self.contest_url, other.contest_url);
        overlay(&mut self.problem_id, other.problem_id);
    }
}

/// The effective configuration of a directory, templates already compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub template_src: Option<PathBuf>,
    pub contest_template: Vec<PathBuf>,
    pub compile_debug_str: String,
    pub compile_debug: CommandTemplate,
    pub compile_opt_str: String,
    pub compile_opt: CommandTemplate,
    pub bundle_source_str: String,
    pub bundle_source: CommandTemplate,
    pub pbcopy: String,
    pub contest_url: String,
    pub problem_id: String,
}

impl Configuration {
    pub fn compile(merged: ConfigFragment) -> Result<Self, ConfigError> {
        let template_src = match merged.template_src {
            Some(s) if !s.is_empty() => Some(expand_home(&s)?),
            _ => None,
        };
        let contest_template = merged
            .contest_template
            .unwrap_or_default()
            .iter()
            .map(|s| expand_home(s))
            .collect::<Result<Vec<_>, _>>()?;

        let compile_debug_str = merged.compile_debug.unwrap_or_default();
        let compile_opt_str = merged.compile_opt.unwrap_or_default();
        let bundle_source_str = merged.bundle_source.unwrap_or_default();

        Ok(Configuration {
            template_src,
            contest_template,
            compile_debug: compile_field("compile_debug", &compile_debug_str)?,
            compile_debug_str,
            compile_opt: compile_field("compile_opt", &compile_opt_str)?,
            compile_opt_str,
            bundle_source: compile_field("bundle_source", &bundle_source_str)?,
            bundle_source_str,
            pbcopy: merged.pbcopy.unwrap_or_default(),
            contest_url: merged.contest_url.unwrap_or_default(),
            problem_id: merged.problem_id.unwrap_or_default(),
        })
    }
}

fn compile_field(field: &'static str, src: &str) -> Result<CommandTemplate, ConfigError> {
    CommandTemplate::compile(field, src).map_err(|source| ConfigError::Template { field, source })
}

/// Expands a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf, ConfigError> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let dirs = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
            Ok(dirs.home_dir().join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

// Lexical clean-up only; symlinks are deliberately left alone.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => (),
            Component::ParentDir => {
                out.pop();
            }
            c => out.push(c),
        }
    }
    out
}

/// The directory `path` lives in (or `path` itself if it is a directory),
/// followed by all its ancestors up to the filesystem root.
pub fn ancestor_dirs<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>, ConfigError> {
    let path = path.as_ref();
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };

    let not_found = |source| ConfigError::NotFound {
        path: path.to_path_buf(),
        source,
    };
    let abs = clean(&std::path::absolute(path).map_err(not_found)?);
    let meta = std::fs::metadata(&abs).map_err(not_found)?;

    let start = if meta.is_dir() {
        abs.as_path()
    } else {
        abs.parent().unwrap_or(&abs)
    };

    Ok(start.ancestors().map(Path::to_path_buf).collect())
}

/// Resolves and memoizes the effective configuration of paths.
///
/// The cache is keyed by the exact path the caller passed in, so `a/b`
/// and `./a/b` are resolved separately.
#[derive(Default)]
pub struct ConfigResolver {
    cache: HashMap<OsString, Rc<Configuration>>,
    fragment_reads: usize,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Rc<Configuration>, ConfigError> {
        let path = path.as_ref();
        if let Some(config) = self.cache.get(path.as_os_str()) {
            debug!("config for {} already read, skip", path.display());
            return Ok(Rc::clone(config));
        }

        let mut merged = ConfigFragment::default();
        for dir in ancestor_dirs(path)?.iter().rev() {
            let file = dir.join(FRAGMENT_FILE);
            if std::fs::metadata(&file).is_err() {
                continue;
            }
            let fragment = ConfigFragment::from_file(&file)?;
            self.fragment_reads += 1;
            debug!("read fragment {}: {:?}", file.display(), fragment);
            merged.merge(fragment);
        }

        let config = Rc::new(Configuration::compile(merged)?);
        debug!(
            "config for {} ({} fragments read so far): {:?}",
            path.display(),
            self.fragment_reads,
            config
        );

        self.cache.insert(path.as_os_str().to_os_string(), Rc::clone(&config));
        Ok(config)
    }

    /// Number of fragment files decoded so far.
    #[cfg(test)]
    pub fn fragment_reads(&self) -> usize {
        self.fragment_reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fragment(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(FRAGMENT_FILE), body).unwrap();
    }

    #[test]
    fn ancestors_start_at_containing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("abc").join("a");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.cpp"), "").unwrap();

        let dirs = ancestor_dirs(dir.join("main.cpp")).unwrap();
        let expected = clean(&std::path::absolute(&dir).unwrap());
        assert_eq!(dirs[0], expected);
        assert_eq!(dirs[1], expected.parent().unwrap());
        assert_eq!(dirs.last().unwrap().parent(), None);

        let again = ancestor_dirs(dir.join("..").join("a")).unwrap();
        assert_eq!(again, dirs);
    }

    #[test]
    fn missing_path_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let mut r = ConfigResolver::new();
        let p = tmp.path().join("nope");
        let err = r.resolve(p.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn deepest_fragment_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let leaf = root.join("contest").join("a");
        write_fragment(
            root,
            r#"
compile_debug = "g++ -g {{.Source}}"
compile_opt = "g++ -O2 {{.Source}}"
pbcopy = "xclip"
unknown_key = 1
"#,
        );
        write_fragment(
            &root.join("contest"),
            "contest_url = \"https://atcoder.jp/contests/abc100\"\n",
        );
        write_fragment(
            &leaf,
            "compile_opt = \"clang++ -O3 {{.Source}}\"\nproblem_id = \"a\"\n",
        );

        let mut r = ConfigResolver::new();
        let c = r.resolve(leaf.to_str().unwrap()).unwrap();
        assert_eq!(c.compile_debug_str, "g++ -g {{.Source}}");
        assert_eq!(c.compile_opt_str, "clang++ -O3 {{.Source}}");
        assert_eq!(c.pbcopy, "xclip");
        assert_eq!(c.contest_url, "https://atcoder.jp/contests/abc100");
        assert_eq!(c.problem_id, "a");
        assert!(c.bundle_source.is_empty());
        assert_eq!(c.template_src, None);
    }

    #[test]
    fn present_empty_key_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let leaf = tmp.path().join("p");
        write_fragment(tmp.path(), "bundle_source = \"bundle {{.Source}}\"\n");
        write_fragment(&leaf, "bundle_source = \"\"\n");

        let mut r = ConfigResolver::new();
        let c = r.resolve(leaf.to_str().unwrap()).unwrap();
        assert_eq!(c.bundle_source_str, "");
        assert!(c.bundle_source.is_empty());
    }

    #[test]
    fn second_resolve_hits_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let leaf = tmp.path().join("x").join("y");
        write_fragment(tmp.path(), "problem_id = \"root\"\n");
        write_fragment(&leaf, "problem_id = \"leaf\"\n");
        let key = leaf.to_str().unwrap();

        let mut r = ConfigResolver::new();
        let first = r.resolve(key).unwrap();
        let reads = r.fragment_reads();
        assert!(reads >= 2);

        // Changing the file afterwards is invisible to the cached entry.
        write_fragment(&leaf, "problem_id = \"changed\"\n");
        let second = r.resolve(key).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(r.fragment_reads(), reads);
        assert_eq!(second.problem_id, "leaf");

        // A different spelling of the same directory is a new key.
        let other = format!("{}/.", key);
        let third = r.resolve(&other).unwrap();
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(third.problem_id, "changed");
        assert!(r.fragment_reads() > reads);
    }

    #[test]
    fn malformed_fragment_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        let leaf = tmp.path().join("p");
        write_fragment(tmp.path(), "compile_debug = [unterminated\n");
        write_fragment(&leaf, "problem_id = \"a\"\n");

        let mut r = ConfigResolver::new();
        let err = r.resolve(leaf.to_str().unwrap()).unwrap_err();
        match err {
            ConfigError::Decode { path, .. } => assert_eq!(path, tmp.path().join(FRAGMENT_FILE)),
            e => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn non_utf8_fragment_is_a_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(FRAGMENT_FILE), b"problem_id = \"\xff\xfe\"\n").unwrap();

        let mut r = ConfigResolver::new();
        let err = r.resolve(tmp.path()).unwrap_err();
        match err {
            ConfigError::Decode { path, .. } => assert_eq!(path, tmp.path().join(FRAGMENT_FILE)),
            e => panic!("unexpected error: {}", e),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_directory_names_resolve() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let leaf = tmp.path().join(OsStr::from_bytes(b"contest-\xff"));
        write_fragment(&leaf, "problem_id = \"a\"\n");

        let mut r = ConfigResolver::new();
        let c = r.resolve(&leaf).unwrap();
        assert_eq!(c.problem_id, "a");
        assert!(Rc::ptr_eq(&c, &r.resolve(&leaf).unwrap()));
    }

    #[test]
    fn bad_template_names_field() {
        let tmp = tempfile::tempdir().unwrap();
        write_fragment(tmp.path(), "compile_opt = \"g++ {{.Source\"\n");

        let mut r = ConfigResolver::new();
        let err = r.resolve(tmp.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Template {
                field: "compile_opt",
                ..
            }
        ));
        assert!(err.to_string().starts_with("bad compile_opt template"));
    }

    #[test]
    fn home_shorthand_is_expanded() {
        let tmp = tempfile::tempdir().unwrap();
        write_fragment(
            tmp.path(),
            r#"
template_src = "~/lib/base.cpp"
contest_template = ["~/lib/.clang-format", "/abs/CMakeLists.txt"]
"#,
        );

        let home = directories::BaseDirs::new().unwrap().home_dir().to_path_buf();
        let mut r = ConfigResolver::new();
        let c = r.resolve(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(c.template_src, Some(home.join("lib/base.cpp")));
        assert_eq!(
            c.contest_template,
            vec![home.join("lib/.clang-format"), PathBuf::from("/abs/CMakeLists.txt")]
        );
    }

    #[test]
    fn fragment_serializes_only_set_keys() {
        let f = ConfigFragment {
            contest_url: Some(String::from("https://atcoder.jp/contests/abc100")),
            problem_id: Some(String::from("a")),
            ..Default::default()
        };
        let text = toml::to_string(&f).unwrap();
        assert!(!text.contains("compile_debug"));
        let back: ConfigFragment = toml::from_str(&text).unwrap();
        assert_eq!(back, f);
    }
}
