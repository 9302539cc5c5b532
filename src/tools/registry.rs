//! Name-keyed tool registry.

use std::collections::HashMap;

use crate::config::PaperConfig;
use crate::error::RegistryError;
use crate::tools::{ReadPaperTool, Tool, ToolDefinition};

/// Registered tools, in registration order.
///
/// There is no removal: once startup is done the registry is wrapped in an
/// `Arc` and never mutated again.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry with every tool this server ships.
    ///
    /// # Errors
    ///
    /// Returns an error if two built-in tools share a name.
    pub fn standard(config: &PaperConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(ReadPaperTool::new(config.clone()))?;
        Ok(registry)
    }

    /// Adds a tool keyed by its name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if the name is taken.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool { name });
        }

        tracing::debug!(tool = %name, "Registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(Box::new(tool));
        Ok(())
    }

    /// Finds a tool by exact name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Returns the descriptors of all tools in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Returns the registered tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
