use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use super::content::CallToolResult;
use super::error::ToolError;
use super::schema::{Arguments, ObjectShape};

/// Minimal metadata every tool must expose.
pub trait ToolSpec {
    fn name(&self) -> &str;
    fn title(&self) -> Option<&str> {
        None
    }
    fn description(&self) -> &str;
    fn input_schema(&self) -> &ObjectShape;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_owned(),
            title: self.title().map(str::to_owned),
            description: self.description().to_owned(),
            input_schema: self.input_schema().to_json_schema(),
        }
    }
}

/// Tool = Spec + handler. `call` receives arguments already checked against
/// [`ToolSpec::input_schema`].
#[async_trait]
pub trait Tool: ToolSpec + Send + Sync {
    async fn call(&self, arguments: Arguments) -> Result<CallToolResult, ToolError>;
}

/// Display metadata; no behavioural effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolMetadata {
    pub title: Option<String>,
    pub description: String,
}

impl ToolMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: Some(title.into()), description: description.into() }
    }
}

/// What `tools/list` advertises for one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    pub input_schema: serde_json::Value,
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, ToolError>> + Send>>;

/// A tool assembled from a name, metadata, schema and an async closure.
pub struct FnTool {
    name: String,
    metadata: ToolMetadata,
    input_schema: ObjectShape,
    handler: Arc<dyn Fn(Arguments) -> HandlerFuture + Send + Sync>,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        metadata: ToolMetadata,
        input_schema: ObjectShape,
        handler: F,
    ) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            metadata,
            input_schema,
            handler: Arc::new(move |args| -> HandlerFuture { Box::pin(handler(args)) }),
        }
    }
}

impl ToolSpec for FnTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }
    fn description(&self) -> &str {
        &self.metadata.description
    }
    fn input_schema(&self) -> &ObjectShape {
        &self.input_schema
    }
}

#[async_trait]
impl Tool for FnTool {
    async fn call(&self, arguments: Arguments) -> Result<CallToolResult, ToolError> {
        (self.handler)(arguments).await
    }
}
