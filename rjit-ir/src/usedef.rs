//! Use-def graph
//!
//! Every IR value lives in a [`ValueGraph`] arena and is addressed by a
//! [`ValueId`]. A value that references other values (a *user*) owns a list of
//! operand slots; each slot is a [`Use`] record that is also registered in the
//! reverse-use list of the value it points at. All rewrites go through
//! [`ValueGraph::set_use`], which keeps both directions in sync.

use crate::value::ValueKind;
use rjit_common::{SourceLocation, Type};
use std::fmt;

/// Handle of a value in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle of a use edge in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UseId(pub u32);

/// A typed edge from a user to the value it references.
/// The user never changes; the value may be nulled.
#[derive(Debug, Clone, PartialEq)]
pub struct Use {
    pub value: Option<ValueId>,
    pub user: ValueId,
}

/// Node of the arena
#[derive(Debug, Clone)]
pub struct ValueData {
    pub kind: ValueKind,
    pub ty: Type,
    /// Source context the value was created under
    pub location: Option<SourceLocation>,
    /// Reverse uses: every use edge pointing at this value
    pub uses: Vec<UseId>,
    /// Operand slots, in order
    pub operands: Vec<UseId>,
    /// Maximum number of operand slots, `None` for unbounded users
    pub operand_limit: Option<usize>,
}

/// Arena holding every value and use edge of a module
#[derive(Debug, Clone, Default)]
pub struct ValueGraph {
    values: Vec<ValueData>,
    uses: Vec<Use>,
}

impl ValueGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new value with no operands
    pub fn add(&mut self, kind: ValueKind, ty: Type, operand_limit: Option<usize>) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData {
            kind,
            ty,
            location: None,
            uses: Vec::new(),
            operands: Vec::new(),
            operand_limit,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    pub fn value_mut(&mut self, id: ValueId) -> &mut ValueData {
        &mut self.values[id.0 as usize]
    }

    pub fn kind(&self, id: ValueId) -> &ValueKind {
        &self.value(id).kind
    }

    pub fn ty(&self, id: ValueId) -> &Type {
        &self.value(id).ty
    }

    pub fn get_use(&self, id: UseId) -> &Use {
        &self.uses[id.0 as usize]
    }

    /// Append an operand slot to `user` pointing at `value`
    pub fn add_operand(&mut self, user: ValueId, value: Option<ValueId>) -> UseId {
        let data = self.value(user);
        if let Some(limit) = data.operand_limit {
            assert!(
                data.operands.len() < limit,
                "operand limit of {} exceeded on {}",
                limit,
                user
            );
        }

        let use_id = UseId(self.uses.len() as u32);
        self.uses.push(Use { value: None, user });
        self.value_mut(user).operands.push(use_id);
        self.set_use(use_id, value);
        use_id
    }

    /// Point a use at a new value, deregistering it from the old one
    pub fn set_use(&mut self, use_id: UseId, value: Option<ValueId>) {
        let old = self.uses[use_id.0 as usize].value;
        if old == value {
            return;
        }

        if let Some(old) = old {
            self.value_mut(old).uses.retain(|&u| u != use_id);
        }
        if let Some(new) = value {
            self.value_mut(new).uses.push(use_id);
        }
        self.uses[use_id.0 as usize].value = value;
    }

    pub fn operand(&self, user: ValueId, index: usize) -> Option<ValueId> {
        self.value(user)
            .operands
            .get(index)
            .and_then(|&u| self.get_use(u).value)
    }

    /// Operand values in slot order, nulled slots included
    pub fn operands(&self, user: ValueId) -> Vec<Option<ValueId>> {
        self.value(user)
            .operands
            .iter()
            .map(|&u| self.get_use(u).value)
            .collect()
    }

    pub fn operand_count(&self, user: ValueId) -> usize {
        self.value(user).operands.len()
    }

    pub fn set_operand(&mut self, user: ValueId, index: usize, value: Option<ValueId>) {
        let use_id = self.value(user).operands[index];
        self.set_use(use_id, value);
    }

    /// Distinct users of a value, in the order their uses were registered
    pub fn users(&self, value: ValueId) -> Vec<ValueId> {
        let mut users = Vec::new();
        for &u in &self.value(value).uses {
            let user = self.get_use(u).user;
            if !users.contains(&user) {
                users.push(user);
            }
        }
        users
    }

    pub fn use_count(&self, value: ValueId) -> usize {
        self.value(value).uses.len()
    }

    /// Rewrite every use of `this` to point at `with`
    pub fn replace_by(&mut self, this: ValueId, with: ValueId) {
        if this == with {
            return;
        }
        while let Some(&use_id) = self.value(this).uses.first() {
            self.set_use(use_id, Some(with));
        }
    }

    /// Erase every operand slot of `user` that references `value`.
    /// Passing `None` purges nulled slots.
    pub fn remove_value(&mut self, user: ValueId, value: Option<ValueId>) {
        let slots = self.value(user).operands.clone();
        let mut kept = Vec::with_capacity(slots.len());
        for use_id in slots {
            if self.get_use(use_id).value == value {
                self.set_use(use_id, None);
            } else {
                kept.push(use_id);
            }
        }
        self.value_mut(user).operands = kept;
    }

    /// Remove `this` from the operand list of every user
    pub fn remove_from_users(&mut self, this: ValueId) {
        for user in self.users(this) {
            self.remove_value(user, Some(this));
        }
    }

    /// Null and erase all operand slots of `user`
    pub fn drop_operands(&mut self, user: ValueId) {
        let slots = std::mem::take(&mut self.value_mut(user).operands);
        for use_id in slots {
            self.set_use(use_id, None);
        }
    }

    /// Check that every operand slot is registered with its target and
    /// every reverse use points back at a slot of its user
    pub fn verify_use_lists(&self) -> Result<(), String> {
        for (index, data) in self.values.iter().enumerate() {
            let id = ValueId(index as u32);
            for &use_id in &data.operands {
                let edge = self.get_use(use_id);
                if edge.user != id {
                    return Err(format!("operand slot of {} owned by {}", id, edge.user));
                }
                if let Some(target) = edge.value {
                    if !self.value(target).uses.contains(&use_id) {
                        return Err(format!("use {} -> {} not registered", id, target));
                    }
                }
            }
            for &use_id in &data.uses {
                let edge = self.get_use(use_id);
                if edge.value != Some(id) {
                    return Err(format!("stale reverse use on {}", id));
                }
                if !self.value(edge.user).operands.contains(&use_id) {
                    return Err(format!("reverse use on {} has no operand slot", id));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(n: usize) -> (ValueGraph, Vec<ValueId>) {
        let mut graph = ValueGraph::new();
        let ids = (0..n)
            .map(|i| graph.add(ValueKind::ConstInt(i as i64), Type::Int32, None))
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_add_operand_registers_use() {
        let (mut graph, ids) = graph_with(2);
        let use_id = graph.add_operand(ids[0], Some(ids[1]));

        assert_eq!(graph.operand(ids[0], 0), Some(ids[1]));
        assert_eq!(graph.value(ids[1]).uses, vec![use_id]);
        assert_eq!(graph.users(ids[1]), vec![ids[0]]);
        assert!(graph.verify_use_lists().is_ok());
    }

    #[test]
    fn test_set_use_moves_registration() {
        let (mut graph, ids) = graph_with(3);
        let use_id = graph.add_operand(ids[0], Some(ids[1]));
        graph.set_use(use_id, Some(ids[2]));

        assert_eq!(graph.use_count(ids[1]), 0);
        assert_eq!(graph.use_count(ids[2]), 1);
        assert_eq!(graph.get_use(use_id).user, ids[0]);
        assert!(graph.verify_use_lists().is_ok());
    }

    #[test]
    fn test_replace_by() {
        let (mut graph, ids) = graph_with(4);
        graph.add_operand(ids[0], Some(ids[2]));
        graph.add_operand(ids[1], Some(ids[2]));
        graph.add_operand(ids[1], Some(ids[2]));

        graph.replace_by(ids[2], ids[3]);
        assert_eq!(graph.use_count(ids[2]), 0);
        assert_eq!(graph.use_count(ids[3]), 3);
        assert_eq!(graph.operands(ids[1]), vec![Some(ids[3]), Some(ids[3])]);

        // replacing a value by itself is a no-op
        graph.replace_by(ids[3], ids[3]);
        assert_eq!(graph.use_count(ids[3]), 3);
        assert!(graph.verify_use_lists().is_ok());
    }

    #[test]
    fn test_remove_value_and_nulls() {
        let (mut graph, ids) = graph_with(3);
        graph.add_operand(ids[0], Some(ids[1]));
        graph.add_operand(ids[0], Some(ids[2]));
        graph.add_operand(ids[0], Some(ids[1]));

        graph.remove_value(ids[0], Some(ids[1]));
        assert_eq!(graph.operands(ids[0]), vec![Some(ids[2])]);
        assert_eq!(graph.use_count(ids[1]), 0);

        graph.set_operand(ids[0], 0, None);
        graph.add_operand(ids[0], Some(ids[1]));
        graph.remove_value(ids[0], None);
        assert_eq!(graph.operands(ids[0]), vec![Some(ids[1])]);
        assert!(graph.verify_use_lists().is_ok());
    }

    #[test]
    fn test_remove_from_users_and_drop() {
        let (mut graph, ids) = graph_with(3);
        graph.add_operand(ids[0], Some(ids[2]));
        graph.add_operand(ids[1], Some(ids[2]));
        graph.add_operand(ids[1], Some(ids[0]));

        graph.remove_from_users(ids[2]);
        assert_eq!(graph.use_count(ids[2]), 0);
        assert_eq!(graph.operand_count(ids[0]), 0);
        assert_eq!(graph.operands(ids[1]), vec![Some(ids[0])]);

        graph.drop_operands(ids[1]);
        assert_eq!(graph.operand_count(ids[1]), 0);
        assert_eq!(graph.use_count(ids[0]), 0);
        assert!(graph.verify_use_lists().is_ok());
    }

    #[test]
    #[should_panic(expected = "operand limit")]
    fn test_operand_limit_enforced() {
        let mut graph = ValueGraph::new();
        let user = graph.add(ValueKind::ConstInt(0), Type::Void, Some(1));
        let a = graph.add(ValueKind::ConstInt(1), Type::Int32, Some(0));
        graph.add_operand(user, Some(a));
        graph.add_operand(user, Some(a));
    }
}
