//! Mesh hierarchy transform composition

use hgpkit_core::Matrix;

use crate::traits::{ParseError, ParseResult};

/// Compose per-mesh world transforms from local transforms and parent links
///
/// Nodes are given parent-before-child, so a single ascending pass suffices:
/// roots (`-1`) keep their local transform and every other node gets
/// `local[i] * world[parent]`. A parent index that does not precede its child
/// is rejected.
pub fn compose_world_transforms(local: &[Matrix], parents: &[i8]) -> ParseResult<Vec<Matrix>> {
    if local.len() != parents.len() {
        return Err(ParseError::InvalidStructure(format!(
            "{} local transforms for {} mesh tree nodes",
            local.len(),
            parents.len()
        )));
    }

    let mut world: Vec<Matrix> = Vec::with_capacity(local.len());
    for (i, (&transform, &parent)) in local.iter().zip(parents).enumerate() {
        let composed = if parent == -1 {
            transform
        } else {
            let parent_world = usize::try_from(parent)
                .ok()
                .and_then(|p| world.get(p))
                .ok_or(ParseError::InvalidIndex {
                    kind: "mesh tree parent",
                    index: i64::from(parent),
                    limit: i,
                })?;
            transform * *parent_world
        };
        world.push(composed);
    }

    Ok(world)
}

/// Transform applied to the single mesh of a static (odd) layer slot
pub fn static_slot_transform(static_transform: Matrix, root_world: Matrix) -> Matrix {
    static_transform * root_world
}
