//! Groups a flat list of matched file paths into a per-folder tree.
//!
//! Only one directory level below each root is synthesized: a file at
//! `root/a/b/x.ts` lands in a folder node labelled `b` (path `root/a/b`)
//! that hangs directly off the root.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::workspace::WorkspaceFolder;
use crate::tree::node::{Node, NodeId, NodeKind, Tree};

/// Search results for one workspace folder.
#[derive(Debug, Clone)]
pub struct FolderMatches {
    pub folder: WorkspaceFolder,
    pub files: Vec<PathBuf>,
}

/// Build a fresh tree with one root per folder, in folder order.
pub fn build_tree(folders: &[FolderMatches]) -> Tree {
    let mut tree = Tree::new();
    for entry in folders {
        group_folder(&mut tree, &entry.folder, &entry.files);
    }
    debug!(roots = tree.roots().len(), nodes = tree.len(), "tree built");
    tree
}

/// Add a root for `folder` and group `files` under it.
///
/// Files outside the folder root are ignored.
pub fn group_folder(tree: &mut Tree, folder: &WorkspaceFolder, files: &[PathBuf]) -> NodeId {
    let trunk = tree.add_root(&folder.name, &folder.root_path);

    let mut sorted: Vec<&PathBuf> = files
        .iter()
        .filter(|p| p.starts_with(&folder.root_path))
        .collect();
    sorted.sort_by(|a, b| compare_paths(a, b));
    sorted.dedup();

    for file in sorted {
        let Some((filename, parent_dir)) = split_path(file) else {
            continue;
        };

        if same_path_ignore_case(&parent_dir, &folder.root_path) {
            tree.push_child(trunk, &filename, file, NodeKind::File);
            continue;
        }

        let bucket = tree.find_child(trunk, &parent_dir).unwrap_or_else(|| {
            let label = segment_label(&parent_dir);
            tree.push_child(trunk, &label, &parent_dir, NodeKind::Folder)
        });
        tree.push_child(bucket, &filename, file, NodeKind::File);
    }

    trunk
}

/// Split a path at its last separator into `(filename, parent_dir)`.
pub fn split_path(path: &Path) -> Option<(String, PathBuf)> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let parent = path.parent()?.to_path_buf();
    Some((filename, parent))
}

/// Locale-style path order: case-insensitive first, lowercase before
/// uppercase on ties. Only identical paths compare equal.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    locale_cmp(&a.to_string_lossy(), &b.to_string_lossy())
}

fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}

/// Sibling order used when re-sorting a patched folder: folders before
/// files, then [`compare_paths`].
pub fn compare_nodes(a: &Node, b: &Node) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| compare_paths(&a.path, &b.path))
}

pub(crate) fn same_path_ignore_case(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

fn segment_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(root: &str) -> WorkspaceFolder {
        WorkspaceFolder::new(root)
    }

    fn matches(root: &str, files: &[&str]) -> FolderMatches {
        FolderMatches {
            folder: folder(root),
            files: files.iter().map(PathBuf::from).collect(),
        }
    }

    fn labels(tree: &Tree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| tree.get(id).unwrap().label.clone())
            .collect()
    }

    #[test]
    fn root_files_and_one_level_folder() {
        let tree = build_tree(&[matches(
            "/root",
            &["/root/sub/c.ts", "/root/a.ts", "/root/sub/b.ts"],
        )]);
        let root = tree.roots()[0];
        let children = tree.children(root).to_vec();
        assert_eq!(labels(&tree, &children), vec!["a.ts", "sub"]);
        assert_eq!(tree.get(children[0]).unwrap().kind, NodeKind::File);
        assert_eq!(tree.get(children[1]).unwrap().kind, NodeKind::Folder);

        let sub = tree.children(children[1]).to_vec();
        assert_eq!(labels(&tree, &sub), vec!["b.ts", "c.ts"]);
    }

    #[test]
    fn shared_parent_yields_single_folder() {
        let tree = build_tree(&[matches(
            "/w",
            &["/w/lib/z.ts", "/w/lib/m.ts", "/w/lib/a.ts", "/w/lib/q.ts"],
        )]);
        let root = tree.roots()[0];
        assert_eq!(tree.children(root).len(), 1);
        let lib = tree.children(root)[0];
        assert_eq!(tree.get(lib).unwrap().path, PathBuf::from("/w/lib"));
        assert_eq!(
            labels(&tree, tree.children(lib)),
            vec!["a.ts", "m.ts", "q.ts", "z.ts"]
        );
    }

    #[test]
    fn file_at_root_has_no_intermediate_folder() {
        let tree = build_tree(&[matches("/w", &["/w/index.ts"])]);
        let root = tree.roots()[0];
        let child = tree.children(root)[0];
        let node = tree.get(child).unwrap();
        assert_eq!(node.kind, NodeKind::File);
        assert_eq!(node.parent, Some(root));
    }

    #[test]
    fn root_match_ignores_case() {
        let tree = build_tree(&[FolderMatches {
            folder: WorkspaceFolder {
                name: "w".into(),
                root_path: PathBuf::from("/W"),
            },
            files: vec![PathBuf::from("/W/a.ts")],
        }]);
        let root = tree.roots()[0];
        assert_eq!(tree.get(tree.children(root)[0]).unwrap().kind, NodeKind::File);
    }

    #[test]
    fn deep_file_collapses_into_nearest_bucket() {
        let tree = build_tree(&[matches("/w", &["/w/a/b/x.ts", "/w/a/y.ts"])]);
        let root = tree.roots()[0];
        let children = tree.children(root).to_vec();
        assert_eq!(labels(&tree, &children), vec!["b", "a"]);
        assert_eq!(tree.get(children[0]).unwrap().path, PathBuf::from("/w/a/b"));
        assert_eq!(tree.parent(children[0]), Some(root));
    }

    #[test]
    fn no_folders_gives_empty_tree() {
        let tree = build_tree(&[]);
        assert!(tree.roots().is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn one_root_per_folder() {
        let tree = build_tree(&[
            matches("/one", &["/one/a.ts"]),
            matches("/two", &[]),
        ]);
        assert_eq!(labels(&tree, tree.roots()), vec!["one", "two"]);
        assert_eq!(
            tree.get(tree.roots()[1]).unwrap().path,
            PathBuf::from("/two")
        );
        assert!(tree.children(tree.roots()[1]).is_empty());
    }

    #[test]
    fn foreign_and_duplicate_paths_are_dropped() {
        let tree = build_tree(&[matches(
            "/w",
            &["/w/a.ts", "/w/a.ts", "/elsewhere/b.ts"],
        )]);
        assert_eq!(tree.children(tree.roots()[0]).len(), 1);
    }

    #[test]
    fn sorting_is_case_insensitive() {
        let tree = build_tree(&[matches("/w", &["/w/b.ts", "/w/C.ts", "/w/a.ts"])]);
        assert_eq!(
            labels(&tree, tree.children(tree.roots()[0])),
            vec!["a.ts", "b.ts", "C.ts"]
        );
    }

    #[test]
    fn compare_paths_is_total() {
        assert_eq!(
            compare_paths(Path::new("/w/a.ts"), Path::new("/w/A.ts")),
            Ordering::Less
        );
        assert_eq!(
            compare_paths(Path::new("/w/A.ts"), Path::new("/w/a.ts")),
            Ordering::Greater
        );
        assert_eq!(
            compare_paths(Path::new("/w/a.ts"), Path::new("/w/a.ts")),
            Ordering::Equal
        );
    }

    #[test]
    fn compare_nodes_puts_folders_first() {
        let mut tree = Tree::new();
        let root = tree.add_root("w", Path::new("/w"));
        let file = tree.push_child(root, "a.ts", Path::new("/w/a.ts"), NodeKind::File);
        let folder = tree.push_child(root, "z", Path::new("/w/z"), NodeKind::Folder);
        let (file, folder) = (tree.get(file).unwrap(), tree.get(folder).unwrap());
        assert_eq!(compare_nodes(folder, file), Ordering::Less);
        assert_eq!(compare_nodes(file, folder), Ordering::Greater);
        assert_eq!(compare_nodes(file, file), Ordering::Equal);
    }

    #[test]
    fn split_path_at_last_separator() {
        assert_eq!(
            split_path(Path::new("/w/src/app.ts")),
            Some(("app.ts".to_string(), PathBuf::from("/w/src")))
        );
        assert_eq!(split_path(Path::new("/")), None);
    }
}
