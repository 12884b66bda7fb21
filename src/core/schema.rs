//! Tagged value-shape descriptors for tool inputs.
//!
//! A tool declares its input as an [`ObjectShape`]. The same descriptor is
//! used to check incoming arguments and to render the JSON Schema that
//! `tools/list` advertises.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value as J};

use super::error::ToolError;

pub type JsonObject = Map<String, J>;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<Shape>),
    Object(ObjectShape),
}

impl Shape {
    pub fn array_of(item: Shape) -> Self {
        Shape::Array(Box::new(item))
    }

    fn type_name(&self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Number => "number",
            Shape::Integer => "integer",
            Shape::Boolean => "boolean",
            Shape::Array(_) => "array",
            Shape::Object(_) => "object",
        }
    }

    /// Check `value` against this shape. `path` names the value in errors.
    pub fn check(&self, path: &str, value: &J) -> Result<(), ToolError> {
        let matches = match (self, value) {
            (Shape::String, J::String(_)) => true,
            (Shape::Number, J::Number(_)) => true,
            (Shape::Integer, J::Number(n)) => n.is_i64() || n.is_u64(),
            (Shape::Boolean, J::Bool(_)) => true,
            (Shape::Array(item), J::Array(values)) => {
                for (i, v) in values.iter().enumerate() {
                    item.check(&format!("{path}[{i}]"), v)?;
                }
                true
            }
            (Shape::Object(shape), J::Object(obj)) => {
                shape.check_object(path, obj)?;
                true
            }
            _ => false,
        };
        if matches {
            Ok(())
        } else {
            Err(ToolError::validation(
                path,
                format!("expected {}, got {}", self.type_name(), json_type_name(value)),
            ))
        }
    }

    pub fn to_json_schema(&self) -> J {
        match self {
            Shape::Array(item) => json!({ "type": "array", "items": item.to_json_schema() }),
            Shape::Object(shape) => shape.to_json_schema(),
            other => json!({ "type": other.type_name() }),
        }
    }
}

fn json_type_name(value: &J) -> &'static str {
    match value {
        J::Null => "null",
        J::Bool(_) => "boolean",
        J::Number(n) if n.is_f64() => "number",
        J::Number(_) => "integer",
        J::String(_) => "string",
        J::Array(_) => "array",
        J::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    shape: Shape,
    required: bool,
    description: Option<String>,
}

/// Object with named fields. Fields not declared here are tolerated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    fields: Vec<Field>,
}

impl ObjectShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: impl Into<String>, shape: Shape) -> Self {
        self.push(name.into(), shape, true)
    }

    pub fn optional(self, name: impl Into<String>, shape: Shape) -> Self {
        self.push(name.into(), shape, false)
    }

    /// Attach a description to the most recently added field.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.description = Some(description.into());
        }
        self
    }

    fn push(mut self, name: String, shape: Shape, required: bool) -> Self {
        self.fields.retain(|f| f.name != name);
        self.fields.push(Field { name, shape, required, description: None });
        self
    }

    fn check_object(&self, path: &str, obj: &JsonObject) -> Result<(), ToolError> {
        for field in &self.fields {
            let field_path = if path.is_empty() {
                field.name.clone()
            } else {
                format!("{path}.{}", field.name)
            };
            match obj.get(&field.name) {
                Some(v) => field.shape.check(&field_path, v)?,
                None if field.required => {
                    return Err(ToolError::validation(field_path, "missing required field"));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Validate raw `tools/call` arguments. Absent or `null` arguments are
    /// treated as an empty object.
    pub fn validate(&self, arguments: Option<&J>) -> Result<Arguments, ToolError> {
        let obj = match arguments {
            None | Some(J::Null) => JsonObject::new(),
            Some(J::Object(obj)) => obj.clone(),
            Some(other) => {
                return Err(ToolError::validation(
                    "arguments",
                    format!("expected object, got {}", json_type_name(other)),
                ));
            }
        };
        self.check_object("", &obj)?;
        Ok(Arguments(obj))
    }

    pub fn to_json_schema(&self) -> J {
        let mut properties = JsonObject::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut schema = field.shape.to_json_schema();
            if let (Some(desc), Some(obj)) = (&field.description, schema.as_object_mut()) {
                obj.insert("description".into(), J::String(desc.clone()));
            }
            properties.insert(field.name.clone(), schema);
            if field.required {
                required.push(J::String(field.name.clone()));
            }
        }
        json!({ "type": "object", "properties": properties, "required": required })
    }
}

/// Arguments that passed shape validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments(JsonObject);

impl Arguments {
    pub fn get(&self, key: &str) -> Option<&J> {
        self.0.get(key)
    }

    /// Decode into the handler's typed input.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(J::Object(self.0.clone()))
            .map_err(|e| ToolError::validation("arguments", e.to_string()))
    }
}
