//! Bounded ancestry walk
//!
//! Walks a type's ancestors following parent links, honoring bridge splices:
//! when the walk leaves a splice's junction node it continues at the
//! splice's host type instead of the junction's own parent.
//!
//! The walk never loops. A revisited node stops it with [`WalkStop::Cycle`],
//! and the depth bound stops it with [`WalkStop::DepthExceeded`].

use rustc_hash::FxHashSet;

use super::{Splice, TypeId, TypeLink};

/// Default bound on hierarchy walks
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStop {
    /// Reached a node with no parent
    Complete,
    /// The given node was already on the chain
    Cycle(TypeId),
    /// The chain hit the depth bound
    DepthExceeded,
    /// The link of the given node could not be read
    Broken(TypeId),
}

/// Result of an ancestry walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestry {
    /// Nodes from the start node (inclusive) toward the root
    pub chain: Vec<TypeId>,
    /// How the walk ended
    pub stop: WalkStop,
}

impl Ancestry {
    /// Check if the walk reached the end of the hierarchy
    pub fn is_complete(&self) -> bool {
        self.stop == WalkStop::Complete
    }

    /// Check if `ty` appears on the chain
    pub fn contains(&self, ty: TypeId) -> bool {
        self.chain.contains(&ty)
    }
}

/// Walk ancestor-ward from `start`, reading links through `link`.
pub fn walk_ancestry<F>(start: TypeId, max_depth: usize, mut link: F) -> Ancestry
where
    F: FnMut(TypeId) -> Option<TypeLink>,
{
    let mut chain = Vec::new();
    let mut visited = FxHashSet::default();
    let mut splices: Vec<Splice> = Vec::new();
    let mut next = Some(start);

    while let Some(current) = next {
        if chain.len() >= max_depth {
            return Ancestry {
                chain,
                stop: WalkStop::DepthExceeded,
            };
        }
        if !visited.insert(current) {
            return Ancestry {
                chain,
                stop: WalkStop::Cycle(current),
            };
        }
        chain.push(current);

        let Some(link) = link(current) else {
            return Ancestry {
                chain,
                stop: WalkStop::Broken(current),
            };
        };
        if let Some(splice) = link.splice {
            splices.push(splice);
        }

        next = match splices.last() {
            Some(splice) if splice.junction == current => {
                let host = splice.host;
                splices.pop();
                Some(host)
            }
            _ => link.parent.or_else(|| splices.pop().map(|s| s.host)),
        };
    }

    Ancestry {
        chain,
        stop: WalkStop::Complete,
    }
}
