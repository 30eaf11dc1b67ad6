//! The Kling tool set: trait, shared flows, handlers, and registry.

use std::collections::HashMap;
use std::sync::Arc;

pub mod flow;
pub mod spec;

mod element;
mod image2video;
mod image_generation;
mod omni_image;
mod omni_video;
mod text2video;

pub use element::{ElementCreateTool, ElementDeleteTool, ElementQueryTool};
pub use image2video::Image2VideoCreateTool;
pub use image_generation::ImageGenerationCreateTool;
pub use omni_image::{OmniImageCreateTool, OmniImageQueryTool};
pub use omni_video::OmniVideoCreateTool;
pub use spec::{ToolContext, ToolSpec};
pub use text2video::{Text2VideoCreateTool, Text2VideoQueryTool};

/// Every tool in the suite.
#[must_use]
pub fn all_tools() -> Vec<Arc<dyn ToolSpec>> {
    vec![
        Arc::new(Text2VideoCreateTool),
        Arc::new(Text2VideoQueryTool),
        Arc::new(Image2VideoCreateTool),
        Arc::new(ImageGenerationCreateTool),
        Arc::new(OmniImageCreateTool),
        Arc::new(OmniImageQueryTool),
        Arc::new(OmniVideoCreateTool),
        Arc::new(ElementCreateTool),
        Arc::new(ElementDeleteTool),
        Arc::new(ElementQueryTool),
    ]
}

/// Name-indexed collection of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolSpec>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the full tool suite.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for tool in all_tools() {
            registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn ToolSpec>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolSpec>> {
        self.tools.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in sorted order, for stable listings.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_registry_holds_the_full_suite() {
        let registry = ToolRegistry::with_defaults();
        assert_eq!(registry.len(), 10);
        assert_eq!(
            registry.names(),
            vec![
                "element_create",
                "element_delete",
                "element_query",
                "image2video_create",
                "image_generation_create",
                "omni_image_create",
                "omni_image_query",
                "omni_video_create",
                "text2video_create",
                "text2video_query",
            ]
        );
    }

    #[test]
    fn lookup_by_name_round_trips() {
        let registry = ToolRegistry::with_defaults();
        let tool = registry.get("text2video_create").expect("registered");
        assert_eq!(tool.name(), "text2video_create");
        assert!(registry.contains("element_query"));
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn every_tool_declares_an_object_schema() {
        for tool in all_tools() {
            let schema = tool.input_schema();
            assert_eq!(schema["type"], "object", "schema for {}", tool.name());
            assert!(schema["properties"].is_object(), "schema for {}", tool.name());
            assert!(!tool.description().is_empty());
        }
    }
}
