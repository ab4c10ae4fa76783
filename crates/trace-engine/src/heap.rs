//! The simulated heap: objects created by `new T()`, never freed.
//!
//! This engine's heap is deliberately small -- no refcounting, no GC,
//! objects never freed (the model ignores `delete` entirely) -- so it is
//! modelled as a simple append-only arena indexed by
//! insertion order, which doubles as the stable `HeapId`.

use serde_json::json;

use crate::{
    ids::HeapId,
    value::{PointsTo, Value, VisualKind},
};

/// One field of a heap object, in declaration/first-assignment order.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapField {
    pub name: String,
    pub value: Value,
    pub visual_kind: VisualKind,
    /// Populated when `visual_kind == Pointer` and the target is non-null.
    pub points_to: PointsTo,
}

impl HeapField {
    #[must_use]
    pub fn primitive(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            visual_kind: VisualKind::Primitive,
            points_to: None,
        }
    }

    #[must_use]
    pub fn pointer(name: impl Into<String>, points_to: PointsTo) -> Self {
        let value = match points_to {
            Some(target) => Value::Addr(target.as_id_string()),
            None => Value::Null,
        };
        Self {
            name: name.into(),
            value,
            visual_kind: VisualKind::Pointer,
            points_to,
        }
    }
}

/// A dynamically allocated aggregate, created exclusively by `new T()`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapObject {
    pub id: HeapId,
    pub type_name: String,
    pub fields: Vec<HeapField>,
}

impl HeapObject {
    /// Sets a field by name, appending it if not already present (statement
    /// shape 7: `ptr->field = expr;` updates an existing field or appends).
    pub fn set_field(&mut self, name: &str, value: Value, visual_kind: VisualKind, points_to: PointsTo) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.value = value;
            field.visual_kind = visual_kind;
            field.points_to = points_to;
        } else {
            self.fields.push(HeapField {
                name: name.to_owned(),
                value,
                visual_kind,
                points_to,
            });
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&HeapField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Append-only heap arena. `HeapId(n)` always refers to the `n`-th object
/// allocated (1-based); since objects are never freed, this doubles as a
/// stable index with no generation counters needed.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    /// Allocates a new, empty-fields heap object and returns its id.
    pub fn allocate(&mut self, type_name: impl Into<String>, id: HeapId) -> HeapId {
        debug_assert_eq!(id.0 as usize, self.objects.len() + 1, "heap ids must be sequential");
        self.objects.push(HeapObject {
            id,
            type_name: type_name.into(),
            fields: Vec::new(),
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: HeapId) -> Option<&HeapObject> {
        self.objects.get(id.0.checked_sub(1)? as usize)
    }

    pub fn get_mut(&mut self, id: HeapId) -> Option<&mut HeapObject> {
        let idx = id.0.checked_sub(1)? as usize;
        self.objects.get_mut(idx)
    }

    /// All objects in insertion order, for snapshotting.
    #[must_use]
    pub fn objects(&self) -> &[HeapObject] {
        &self.objects
    }
}

/// Renders a heap object to the `HeapObject` JSON schema from the wire schema
#[must_use]
pub fn heap_object_to_json(obj: &HeapObject) -> serde_json::Value {
    json!({
        "id": obj.id.0.to_string(),
        "type": obj.type_name,
        "address": obj.id.0.to_string(),
        "fields": obj.fields.iter().map(|field| json!({
            "name": field.name,
            "value": field.value.to_json(),
            "visualType": field.visual_kind.as_str(),
        })).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_set_field_appends_new_field() {
        let mut heap = Heap::new();
        let id = heap.allocate("Node", HeapId(1));
        let obj = heap.get_mut(id).unwrap();
        obj.set_field("data", Value::Int(10), VisualKind::Primitive, None);
        assert_eq!(heap.get(id).unwrap().fields.len(), 1);
    }

    #[test]
    fn set_field_updates_existing_field_in_place() {
        let mut heap = Heap::new();
        let id = heap.allocate("Node", HeapId(1));
        let obj = heap.get_mut(id).unwrap();
        obj.set_field("data", Value::Int(10), VisualKind::Primitive, None);
        obj.set_field("data", Value::Int(20), VisualKind::Primitive, None);
        assert_eq!(heap.get(id).unwrap().fields.len(), 1);
        assert_eq!(heap.get(id).unwrap().fields[0].value, Value::Int(20));
    }
}
