//! Name-path resolution between entities and context roots.

use crate::app::host::EntityTree;
use crate::domain::errors::NavigationError;
use crate::domain::model::EntityPath;

/// Build the name-path of `entity`, starting at `context_root`.
///
/// When the walk never meets `context_root` the path starts at the topmost ancestor
/// instead.
pub fn path_of<T: EntityTree>(
    tree: &T,
    entity: Option<&T::Entity>,
    context_root: Option<&T::Entity>,
) -> EntityPath {
    let Some(entity) = entity else {
        return EntityPath::empty();
    };

    let mut names = vec![tree.name_of(entity)];
    let mut cursor = entity.clone();
    while Some(&cursor) != context_root {
        match tree.parent_of(&cursor) {
            Some(parent) => {
                names.push(tree.name_of(&parent));
                cursor = parent;
            }
            None => break,
        }
    }

    names.reverse();
    EntityPath::from_segments(names)
}

/// Find the entity named by `path` under `root`.
pub fn resolve<T: EntityTree>(
    tree: &T,
    root: &T::Entity,
    path: &EntityPath,
) -> Result<T::Entity, NavigationError> {
    let not_found = |segment: &str| NavigationError::NotFound {
        path: path.to_string(),
        segment: segment.to_owned(),
    };

    let (first, rest) = path.segments().split_first().ok_or_else(|| not_found(""))?;
    if tree.name_of(root) != *first {
        return Err(not_found(first));
    }

    rest.iter().try_fold(root.clone(), |current, segment| {
        tree.child_named(&current, segment)
            .ok_or_else(|| not_found(segment))
    })
}
