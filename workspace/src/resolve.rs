use crate::error::WorkspaceError;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

const MAX_SYMLINK_HOPS: usize = 40;

enum Part {
    Prefix(OsString),
    Root,
    Parent,
    Normal(OsString),
}

fn push_parts(stack: &mut Vec<Part>, path: &Path) {
    for component in path.components().rev() {
        match component {
            Component::Prefix(p) => stack.push(Part::Prefix(p.as_os_str().to_os_string())),
            Component::RootDir => stack.push(Part::Root),
            Component::CurDir => {}
            Component::ParentDir => stack.push(Part::Parent),
            Component::Normal(name) => stack.push(Part::Normal(name.to_os_string())),
        }
    }
}

/// Canonicalizes `path` without requiring it to exist.
///
/// Existing components are resolved against the filesystem, following
/// symlinks (including dangling ones, through their link text). Missing
/// components are kept as written and `..` pops lexically.
pub(crate) fn soft_canonicalize(path: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut stack = Vec::new();
    push_parts(&mut stack, path);

    let mut resolved = PathBuf::new();
    let mut hops = 0;

    while let Some(part) = stack.pop() {
        match part {
            Part::Prefix(prefix) => resolved = PathBuf::from(prefix),
            Part::Root => resolved.push(Component::RootDir.as_os_str()),
            Part::Parent => {
                resolved.pop();
            }
            Part::Normal(name) => {
                resolved.push(&name);

                match std::fs::symlink_metadata(&resolved) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        hops += 1;
                        if hops > MAX_SYMLINK_HOPS {
                            return Err(WorkspaceError::SymlinkLoop(path.display().to_string()));
                        }
                        let target = std::fs::read_link(&resolved)?;
                        resolved.pop();
                        push_parts(&mut stack, &target);
                    }
                    Ok(_) => {}
                    Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    Ok(resolved)
}

/// True when `path` lies strictly below `parent`, compared component-wise.
pub(crate) fn is_strict_descendant(path: &Path, parent: &Path) -> bool {
    path != parent && path.starts_with(parent)
}
