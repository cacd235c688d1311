// Pure folder-tree rules; the SQL that feeds them lives in folder_service.

use uuid::Uuid;

use super::error::ServiceError;
use crate::database::models::FolderCrumb;

/// True when moving `folder_id` under a parent whose ancestry (parent first
/// or root first, either order) contains the folder itself.
pub fn would_create_cycle(folder_id: Uuid, target_parent_chain: &[Uuid]) -> bool {
    target_parent_chain.contains(&folder_id)
}

/// Depth of the deepest node after placing a subtree of `subtree_height`
/// (0 for a leaf) under a parent at `parent_depth` (0 for the tenant root).
pub fn check_depth(parent_depth: u32, subtree_height: u32, max_depth: u32) -> Result<(), ServiceError> {
    let deepest = parent_depth + 1 + subtree_height;
    if deepest > max_depth {
        return Err(ServiceError::invalid(format!(
            "folder nesting would reach depth {}, the limit is {}",
            deepest, max_depth
        )));
    }
    Ok(())
}

/// Order a chain fetched leaf-first into root-first breadcrumbs and renumber
/// depths so the root is 1.
pub fn breadcrumbs(mut chain: Vec<FolderCrumb>) -> Vec<FolderCrumb> {
    chain.sort_by(|a, b| b.depth.cmp(&a.depth));
    for (i, crumb) in chain.iter_mut().enumerate() {
        crumb.depth = i as i32 + 1;
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_under_self_or_descendant_is_a_cycle() {
        let (root, child, grandchild, other) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        // Target parent is the grandchild: its chain runs back up to root
        assert!(would_create_cycle(root, &[grandchild, child, root]));
        // Target parent is the folder itself
        assert!(would_create_cycle(child, &[child, root]));
        // Sibling tree is fine
        assert!(!would_create_cycle(child, &[other]));
        // Moving to the tenant root has an empty chain
        assert!(!would_create_cycle(child, &[]));
    }

    #[test]
    fn depth_counts_parent_self_and_subtree() {
        assert!(check_depth(0, 0, 1).is_ok());
        assert!(check_depth(1, 0, 1).is_err());
        assert!(check_depth(29, 2, 32).is_ok());
        assert!(check_depth(30, 2, 32).is_err());
    }

    #[test]
    fn breadcrumbs_run_root_first() {
        let crumb = |name: &str, depth| FolderCrumb { id: Uuid::new_v4(), parent_id: None, name: name.to_string(), depth };
        let trail = breadcrumbs(vec![crumb("Q3", 1), crumb("Finance", 3), crumb("Reports", 2)]);

        let names: Vec<&str> = trail.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Finance", "Reports", "Q3"]);
        assert_eq!(trail.iter().map(|c| c.depth).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
