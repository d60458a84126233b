use std::collections::HashSet;

use once_cell::unsync::OnceCell;

use crate::container::Container;

use super::ResolveError;

/// Flattened, memoized listing of every node path in a container.
///
/// The container is walked once, on first use. Containers are read-only for
/// the lifetime of the index, so the listing is never invalidated.
pub struct TreeIndex<'a> {
    container: &'a dyn Container,
    paths: OnceCell<Vec<String>>,
    lookup: OnceCell<HashSet<String>>,
}

impl<'a> TreeIndex<'a> {
    /// Index over `container`; nothing is read until the first query
    pub fn new(container: &'a dyn Container) -> Self {
        Self {
            container,
            paths: OnceCell::new(),
            lookup: OnceCell::new(),
        }
    }

    /// The indexed container
    pub fn container(&self) -> &'a dyn Container {
        self.container
    }

    /// Every node path, depth-first pre-order
    pub fn paths(&self) -> Result<&[String], ResolveError> {
        let paths = self.paths.get_or_try_init(|| self.container.walk())?;
        Ok(paths.as_slice())
    }

    /// Whether a node with exactly this path exists
    pub fn has_marker(&self, name: &str) -> Result<bool, ResolveError> {
        let lookup = self
            .lookup
            .get_or_try_init(|| -> Result<HashSet<String>, ResolveError> {
                Ok(self.paths()?.iter().cloned().collect())
            })?;
        Ok(lookup.contains(name))
    }

    /// True once the container has been walked
    pub fn is_built(&self) -> bool {
        self.paths.get().is_some()
    }
}
