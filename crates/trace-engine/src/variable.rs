//! Variables in the single simulated `main` stack frame.

use serde_json::json;

use crate::{
    ids::VarId,
    value::{PointsTo, Value, VisualKind},
};

/// A value bound to a declared variable: either a scalar or a fixed-length
/// array. Array length is fixed at declaration (data model section 3).
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Scalar(Value),
    Array(Vec<Value>),
}

impl VarValue {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Scalar(v) => v.to_json(),
            Self::Array(items) => json!(items.iter().map(Value::to_json).collect::<Vec<_>>()),
        }
    }
}

/// One entry in the variable map.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: VarId,
    pub name: String,
    pub type_name: String,
    pub value: VarValue,
    pub visual_kind: VisualKind,
    /// Only meaningful when `visual_kind == Pointer`.
    pub points_to: PointsTo,
}

impl Variable {
    #[must_use]
    pub fn primitive(id: VarId, name: impl Into<String>, type_name: impl Into<String>, value: Value) -> Self {
        Self {
            id,
            name: name.into(),
            type_name: type_name.into(),
            value: VarValue::Scalar(value),
            visual_kind: VisualKind::Primitive,
            points_to: None,
        }
    }

    #[must_use]
    pub fn array(id: VarId, name: impl Into<String>, type_name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            id,
            name: name.into(),
            type_name: type_name.into(),
            value: VarValue::Array(values),
            visual_kind: VisualKind::Array,
            points_to: None,
        }
    }

    #[must_use]
    pub fn pointer(id: VarId, name: impl Into<String>, type_name: impl Into<String>, points_to: PointsTo) -> Self {
        let value = match points_to {
            Some(target) => Value::Addr(target.as_id_string()),
            None => Value::Null,
        };
        Self {
            id,
            name: name.into(),
            type_name: type_name.into(),
            value: VarValue::Scalar(value),
            visual_kind: VisualKind::Pointer,
            points_to,
        }
    }

    /// Returns the array backing store, if this is an array variable.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match &self.value {
            VarValue::Array(items) => Some(items),
            VarValue::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.value {
            VarValue::Array(items) => Some(items),
            VarValue::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match &self.value {
            VarValue::Scalar(v) => Some(v),
            VarValue::Array(_) => None,
        }
    }

    /// Updates a pointer variable's target, keeping the rendered value in
    /// sync with `points_to`.
    pub fn set_points_to(&mut self, points_to: PointsTo) {
        self.value = VarValue::Scalar(match points_to {
            Some(target) => Value::Addr(target.as_id_string()),
            None => Value::Null,
        });
        self.points_to = points_to;
    }

    /// Renders the `Variable` JSON schema from the wire schema
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id.0,
            "name": self.name,
            "type": self.type_name,
            "value": self.value.to_json(),
            "visualType": self.visual_kind.as_str(),
            "pointsTo": self.points_to.map(|r| r.as_id_string()),
        })
    }
}
