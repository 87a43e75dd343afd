use std::env;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::errors::*;

pub fn read<P>(path: P) -> Result<String>
where
    P: AsRef<Path>,
{
    read_(path.as_ref())
}

fn read_(path: &Path) -> Result<String> {
    let mut s = String::new();
    File::open(path)
        .wrap_err_with(|| format!("couldn't open {}", path.display()))?
        .read_to_string(&mut s)
        .wrap_err_with(|| format!("couldn't read {}", path.display()))?;
    Ok(s)
}

// same limit as Linux's MAXSYMLINKS
const MAX_LINKS: usize = 40;

/// Follows symbolic links in `path` as far as the filesystem allows.
///
/// Unlike [`fs::canonicalize`], a path whose tail does not exist is not an
/// error. Every component is resolved in turn, dangling links are still
/// replaced by their targets, and missing components are kept unchanged.
/// A symlink loop leaves `path` as is.
pub fn resolve(path: &Path) -> PathBuf {
    let base = if path.is_absolute() {
        PathBuf::from("/")
    } else {
        match env::current_dir() {
            Ok(dir) => dir,
            Err(_) => return path.to_path_buf(),
        }
    };
    let mut links = 0;
    resolve_in(base, path, &mut links).unwrap_or_else(|| path.to_path_buf())
}

fn resolve_in(mut resolved: PathBuf, path: &Path, links: &mut usize) -> Option<PathBuf> {
    for component in path.components() {
        match component {
            Component::Prefix(_) => return None,
            Component::RootDir => resolved = PathBuf::from("/"),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                let candidate = resolved.join(name);
                match fs::read_link(&candidate) {
                    Ok(target) => {
                        *links += 1;
                        if *links > MAX_LINKS {
                            return None;
                        }
                        resolved = resolve_in(resolved, &target, links)?;
                    }
                    Err(_) => resolved = candidate,
                }
            }
        }
    }
    Some(resolved)
}
