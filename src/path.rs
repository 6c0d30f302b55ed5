use std::{
    env, io,
    path::{Component, Path, PathBuf},
};

/// Makes `path` absolute. Tilde safe.
///
/// - An absolute path is returned unchanged.
/// - A path containing `~` has a leading `~` or `~/` replaced by the home
///   directory (`$HOME`).
/// - Anything still relative is joined onto the current directory and
///   lexically normalized (`.` dropped, `..` popped).
///
/// No file system access is made, so the path need not exist. The only
/// failure is an unreadable current directory.
pub fn abs_path<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let expanded = if path.as_os_str().to_string_lossy().contains('~') {
        expand_home(path)
    } else {
        path.to_path_buf()
    };
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    Ok(normalize(&env::current_dir()?.join(expanded)))
}

fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match (components.next(), env::var_os("HOME")) {
        (Some(Component::Normal(first)), Some(home)) if first == "~" => {
            PathBuf::from(home).join(components.as_path())
        }
        _ => path.to_path_buf(),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
