use std::sync::OnceLock;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Number};

use crate::core::content::CallToolResult;
use crate::core::error::ToolError;
use crate::core::schema::{Arguments, ObjectShape, Shape};
use crate::core::tool::{Tool, ToolSpec};

#[derive(Clone, Default)]
pub struct SumTool;

#[derive(Debug, Deserialize)]
struct SumInput {
    numbers: Vec<Number>,
}

/// Literals beyond the `f64` range saturate to an infinity.
fn to_f64(n: &Number) -> f64 {
    n.as_f64()
        .or_else(|| n.to_string().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn schema() -> &'static ObjectShape {
    static SCHEMA: OnceLock<ObjectShape> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        ObjectShape::new()
            .required("numbers", Shape::array_of(Shape::Number))
            .describe("Array of numbers")
    })
}

/// Left fold with plain `f64` addition. NaN and infinities propagate.
pub fn sum(numbers: &[f64]) -> f64 {
    numbers.iter().fold(0.0, |acc, n| acc + n)
}

/// Canonical text form of a result: shortest round-trip decimal, `-0` as
/// `0`, and `NaN` / `Infinity` / `-Infinity` for non-finite values.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 {
            "Infinity".to_owned()
        } else {
            "-Infinity".to_owned()
        }
    } else if value == 0.0 {
        "0".to_owned()
    } else {
        value.to_string()
    }
}

impl ToolSpec for SumTool {
    fn name(&self) -> &str {
        "sum"
    }
    fn title(&self) -> Option<&str> {
        Some("Sum numbers")
    }
    fn description(&self) -> &str {
        "Calculate the sum of all given numbers"
    }
    fn input_schema(&self) -> &ObjectShape {
        schema()
    }
}

#[async_trait]
impl Tool for SumTool {
    async fn call(&self, arguments: Arguments) -> Result<CallToolResult, ToolError> {
        let input: SumInput = arguments.decode()?;
        let numbers: Vec<f64> = input.numbers.iter().map(to_f64).collect();
        let total = sum(&numbers);
        tracing::debug!(count = numbers.len(), total, "sum computed");
        Ok(CallToolResult::text(format_number(total))
            .with_structured(json!({ "input": numbers, "total": total })))
    }
}
