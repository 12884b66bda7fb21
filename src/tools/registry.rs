use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::core::content::CallToolResult;
use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::{Arguments, ObjectShape};
use crate::core::tool::{FnTool, Tool, ToolDescriptor, ToolMetadata};
use crate::tools::sum::SumTool;

/// Name → tool table. Built once at startup, then shared read-only.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    by_name: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A second tool under an existing name is rejected and
    /// the first registration is kept.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_owned();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyToolName);
        }
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        tracing::debug!(tool = %name, "tool registered");
        self.by_name.insert(name, tool);
        Ok(())
    }

    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<String>,
        metadata: ToolMetadata,
        input_schema: ObjectShape,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, ToolError>> + Send + 'static,
    {
        self.register_tool(Arc::new(FnTool::new(name, metadata, input_schema, handler)))
    }

    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn Tool>, ToolError> {
        self.by_name
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_owned()))
    }

    /// Descriptors in name order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.by_name.values().map(|t| t.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// The registry this server ships with.
pub fn build_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register_tool(Arc::new(SumTool))?;
    Ok(registry)
}
