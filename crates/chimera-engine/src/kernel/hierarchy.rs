//! Bounded hierarchy walks through captured primitives

use super::Kernel;
use crate::diagnostics::DiagnosticCode;
use crate::realm::{walk_ancestry, Ancestry, ObjectId, Realm, TypeId, TypeOrigin, WalkStop};

impl Kernel {
    /// Ancestors of `start` (inclusive), following bridge splices.
    ///
    /// Cycles and overflow of the depth bound truncate the chain and are
    /// reported; a link that cannot be read ends the chain at that node.
    pub fn hierarchy(&self, realm: &Realm, start: TypeId) -> Ancestry {
        self.hierarchy_bounded(realm, start, self.max_depth)
    }

    /// [`Kernel::hierarchy`] with an explicit depth bound
    pub fn hierarchy_bounded(&self, realm: &Realm, start: TypeId, max_depth: usize) -> Ancestry {
        let walk = walk_ancestry(start, max_depth.max(1), |ty| self.type_link(realm, ty));
        match walk.stop {
            WalkStop::Complete => {}
            WalkStop::Cycle(ty) => self.report(
                DiagnosticCode::HierarchyCycle,
                format!("hierarchy of {start} revisits {ty}, truncated after {} nodes", walk.chain.len()),
            ),
            WalkStop::DepthExceeded => self.report(
                DiagnosticCode::HierarchyTooDeep,
                format!("hierarchy of {start} exceeds depth {max_depth}, truncated"),
            ),
            WalkStop::Broken(ty) => self.report(
                DiagnosticCode::HierarchyBroken,
                format!("hierarchy of {start} ends at unreadable {ty}"),
            ),
        }
        walk
    }

    /// Ancestor chain of `start` as a plain list
    pub fn hierarchy_chain(&self, realm: &Realm, start: TypeId) -> Vec<TypeId> {
        self.hierarchy(realm, start).chain
    }

    /// Ancestor chain of an object's current hierarchy pointer; empty if
    /// the pointer cannot be read
    pub fn instance_chain(&self, realm: &Realm, obj: ObjectId) -> Vec<TypeId> {
        match self.parent_of(realm, obj) {
            Some(proto) => self.hierarchy_chain(realm, proto),
            None => Vec::new(),
        }
    }

    /// Structural membership: `ty` appears on the object's ancestor chain
    pub fn instance_of(&self, realm: &Realm, obj: ObjectId, ty: TypeId) -> bool {
        self.instance_chain(realm, obj).contains(&ty)
    }

    /// User-class levels of `ty`'s chain, ordered leaf to root
    pub fn user_levels(&self, realm: &Realm, ty: TypeId) -> Vec<TypeId> {
        self.hierarchy_chain(realm, ty)
            .into_iter()
            .take_while(|&t| self.origin_of(realm, t) == Some(TypeOrigin::User))
            .collect()
    }

    /// Hierarchy a type node belongs to
    pub fn origin_of(&self, realm: &Realm, ty: TypeId) -> Option<TypeOrigin> {
        self.type_link(realm, ty).map(|link| link.origin)
    }
}
