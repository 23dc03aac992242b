//! 目录列举结果整理，HTTP 与 S3 两个网关共用

use crate::application::ports::{EntryKind, ListEntry};

/// ListObjectsV2 使用的目录前缀，根目录为空
pub(crate) fn list_prefix_of(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    }
}

/// 把原始 key 与公共前缀转成目录直接子项，按名称排序去重
///
/// 目录占位对象（`dir/`）和更深层级的 key 会被丢弃
pub(crate) fn collect_entries(
    dir: &str,
    objects: impl IntoIterator<Item = (String, Option<u64>)>,
    prefixes: impl IntoIterator<Item = String>,
) -> Vec<ListEntry> {
    let prefix = list_prefix_of(dir);
    let mut entries = Vec::new();

    for (key, size) in objects {
        let Some(name) = key.strip_prefix(&prefix).map(str::to_string) else {
            continue;
        };
        if name.is_empty() || name.contains('/') {
            continue;
        }
        entries.push(ListEntry {
            key,
            name,
            kind: EntryKind::File,
            size,
        });
    }

    for key in prefixes {
        let key = key.trim_end_matches('/');
        let Some(name) = key.strip_prefix(&prefix) else {
            continue;
        };
        if name.is_empty() || name.contains('/') {
            continue;
        }
        entries.push(ListEntry {
            key: key.to_string(),
            name: name.to_string(),
            kind: EntryKind::Directory,
            size: None,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries.dedup_by(|a, b| a.name == b.name);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_direct_children() {
        let entries = collect_entries(
            "site",
            vec![
                ("site/".to_string(), Some(0)),
                ("site/main.html".to_string(), Some(120)),
                ("site/assets/logo.png".to_string(), Some(9)),
                ("other/index.html".to_string(), None),
                ("site/app.js".to_string(), Some(3)),
            ],
            vec!["site/assets/".to_string()],
        );

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["app.js", "assets", "main.html"]);
        assert_eq!(entries[1].kind, EntryKind::Directory);
        assert_eq!(entries[1].key, "site/assets");
        assert_eq!(entries[2].size, Some(120));
    }

    #[test]
    fn test_root_listing() {
        let entries = collect_entries("", vec![("index.html".to_string(), None)], Vec::new());
        assert_eq!(entries.len(), 1);
        assert_eq!(list_prefix_of(""), "");
        assert_eq!(list_prefix_of("a/b"), "a/b/");
    }
}
