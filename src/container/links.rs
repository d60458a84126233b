//! Object traversal over a graph of named links.
//!
//! A file may reach the same object through several hard links, and soft or
//! external links may point anywhere, including at an ancestor. The walk
//! follows hard links only and emits every object once, under the first
//! path that reaches it in name order.

/// One member of a group listing
#[derive(Debug, Clone)]
pub(crate) struct Link<K> {
    /// Member name within its group
    pub name: String,
    /// Identity of the target object; `None` for soft and external links
    pub object: Option<K>,
    /// Whether the target is a group
    pub is_group: bool,
    /// Whether other hard links may reach the same target
    pub shared: bool,
}

impl<K> Link<K> {
    /// Hard link to an object
    pub fn hard(name: impl Into<String>, object: K, is_group: bool, shared: bool) -> Self {
        Self {
            name: name.into(),
            object: Some(object),
            is_group,
            shared,
        }
    }

    /// Soft or external link
    pub fn symbolic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object: None,
            is_group: false,
            shared: false,
        }
    }
}

/// Depth-first preorder walk from the root group.
///
/// `children` lists the links of the group at a path (`""` is the root).
/// Returned paths are relative to the root, without a leading slash.
pub(crate) fn walk_objects<K, E, F>(root: K, mut children: F) -> Result<Vec<String>, E>
where
    K: PartialEq,
    F: FnMut(&str) -> Result<Vec<Link<K>>, E>,
{
    // Only shared objects can be reached twice, so only they are remembered
    let mut seen = vec![root];
    let mut paths = Vec::new();
    descend("", &mut children, &mut seen, &mut paths)?;
    Ok(paths)
}

fn descend<K, E, F>(
    prefix: &str,
    children: &mut F,
    seen: &mut Vec<K>,
    paths: &mut Vec<String>,
) -> Result<(), E>
where
    K: PartialEq,
    F: FnMut(&str) -> Result<Vec<Link<K>>, E>,
{
    let mut links = children(prefix)?;
    links.sort_by(|a, b| a.name.cmp(&b.name));

    for link in links {
        let object = match link.object {
            Some(object) => object,
            None => continue,
        };
        if link.shared || link.is_group {
            if seen.contains(&object) {
                continue;
            }
            seen.push(object);
        }

        let path = if prefix.is_empty() {
            link.name
        } else {
            format!("{}/{}", prefix, link.name)
        };
        paths.push(path.clone());
        if link.is_group {
            descend(&path, children, seen, paths)?;
        }
    }
    Ok(())
}
