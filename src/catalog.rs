//! Block template registry.
//!
//! The designer never builds templates itself. A host registers a factory per
//! block type identifier at startup and the designer asks the registry to
//! instantiate a [`FunctionTemplate`] whenever a block is added.
//!
//! # Example
//!
//! ```
//! use flow_designer::{TemplateAttributes, TemplateRegistry};
//!
//! let registry = TemplateRegistry::with_logic_gates();
//! let and = registry.instantiate("and", &TemplateAttributes::default()).unwrap();
//! assert_eq!(and.label, "AND");
//! assert_eq!(and.pins.len(), 3);
//! ```

use crate::error::{FlowError, Result};
use crate::graph::{Block, BlockId, BlockSide, PinDirection, PinId, SignalType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Behavior attached to a template, run by whatever executes the flow.
pub type Behavior = Rc<dyn Fn(&Block)>;

/// Factory building a fresh template instance from attribute overrides.
pub type TemplateFactory = Box<dyn Fn(&TemplateAttributes) -> FunctionTemplate>;

/// Pin definition as declared by a template.
#[derive(Debug, Clone, PartialEq)]
pub struct PinTemplate {
    pub id: PinId,
    pub label: String,
    pub description: String,
    pub side: BlockSide,
    pub direction: PinDirection,
    pub signal_type: SignalType,
}

impl PinTemplate {
    /// Create a pin definition with a freshly generated id.
    pub fn new(
        label: impl Into<String>,
        description: impl Into<String>,
        side: BlockSide,
        direction: PinDirection,
        signal_type: SignalType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            description: description.into(),
            side,
            direction,
            signal_type,
        }
    }
}

/// A block template: everything needed to place one block instance.
#[derive(Clone)]
pub struct FunctionTemplate {
    /// Registry key this template was built from (e.g. `"and"`)
    pub type_id: String,
    /// Identifier given to the block instantiated from this template
    pub id: BlockId,
    pub label: String,
    pub description: String,
    pub category: String,
    pub pins: Vec<PinTemplate>,
    pub behavior: Option<Behavior>,
}

impl fmt::Debug for FunctionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTemplate")
            .field("type_id", &self.type_id)
            .field("id", &self.id)
            .field("label", &self.label)
            .field("description", &self.description)
            .field("category", &self.category)
            .field("pins", &self.pins)
            .field("behavior", &self.behavior.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl FunctionTemplate {
    pub fn new(type_id: impl Into<String>, pins: Vec<PinTemplate>) -> Self {
        Self {
            type_id: type_id.into(),
            id: Uuid::new_v4(),
            label: String::new(),
            description: String::new(),
            category: String::new(),
            pins,
            behavior: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }
}

/// Optional overrides applied when a template is instantiated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateAttributes {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl TemplateAttributes {
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}

/// Maps block type identifiers to template factories.
#[derive(Default)]
pub struct TemplateRegistry {
    factories: HashMap<String, TemplateFactory>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in digital logic gates.
    pub fn with_logic_gates() -> Self {
        let mut registry = Self::new();
        for type_id in ["and", "or"] {
            registry.register(type_id, move |attrs| two_input_gate(type_id, attrs));
        }
        for type_id in ["delay", "invert", "pulse", "xnor", "xor"] {
            registry.register(type_id, move |attrs| one_input_gate(type_id, attrs));
        }
        registry
    }

    /// Register (or replace) the factory for `type_id`.
    pub fn register<F>(&mut self, type_id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&TemplateAttributes) -> FunctionTemplate + 'static,
    {
        let type_id = type_id.into();
        if self.factories.insert(type_id.clone(), Box::new(factory)).is_some() {
            log::debug!("Replaced template factory for '{}'", type_id);
        }
        self
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }

    /// Registered type identifiers, sorted.
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Build a template for `type_id`, or fail with [`FlowError::UnknownTemplate`].
    pub fn instantiate(
        &self,
        type_id: &str,
        attrs: &TemplateAttributes,
    ) -> Result<FunctionTemplate> {
        let factory = self
            .factories
            .get(type_id)
            .ok_or_else(|| FlowError::UnknownTemplate(type_id.to_string()))?;
        let mut template = factory(attrs);
        template.type_id = type_id.to_string();
        Ok(template)
    }
}

fn apply_attributes(
    template: &mut FunctionTemplate,
    attrs: &TemplateAttributes,
    default_label: String,
) {
    template.id = attrs.id.unwrap_or_else(Uuid::new_v4);
    template.label = attrs.label.clone().unwrap_or(default_label);
    template.description = attrs.description.clone().unwrap_or_default();
}

fn one_input_gate(type_id: &str, attrs: &TemplateAttributes) -> FunctionTemplate {
    let name = type_id.to_uppercase();
    let pins = vec![
        PinTemplate::new(
            "Input 1",
            format!("Binary input of {} gate", name),
            BlockSide::Left,
            PinDirection::Input,
            SignalType::Digital,
        ),
        PinTemplate::new(
            "Output",
            format!("Binary output of {} gate", name),
            BlockSide::Right,
            PinDirection::Output,
            SignalType::Digital,
        ),
    ];
    let mut template = FunctionTemplate::new(type_id, pins).with_category("Logic");
    apply_attributes(&mut template, attrs, String::new());
    template
}

fn two_input_gate(type_id: &str, attrs: &TemplateAttributes) -> FunctionTemplate {
    let name = type_id.to_uppercase();
    let pins = vec![
        PinTemplate::new(
            "Input 1",
            format!("Binary input 1 of {} gate", name),
            BlockSide::Left,
            PinDirection::Input,
            SignalType::Digital,
        ),
        PinTemplate::new(
            "Input 2",
            format!("Binary input 2 of {} gate", name),
            BlockSide::Left,
            PinDirection::Input,
            SignalType::Digital,
        ),
        PinTemplate::new(
            "Output",
            format!("Binary output of {} gate", name),
            BlockSide::Right,
            PinDirection::Output,
            SignalType::Digital,
        ),
    ];
    let mut template = FunctionTemplate::new(type_id, pins).with_category("Logic");
    apply_attributes(&mut template, attrs, name);
    template
}
