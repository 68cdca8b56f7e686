//! # Component Registry
//!
//! The fixed catalogue of component types. Built once, then shared
//! read-only (usually behind an `Arc`) by the validator and the renderer.

use std::collections::{BTreeMap, BTreeSet};

/// Every known component type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    Email,
    Head,
    Preview,
    Body,
    Container,
    Section,
    Row,
    Column,
    Heading,
    Text,
    Button,
    Image,
    Divider,
    Spacer,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 14] = [
        ComponentKind::Email,
        ComponentKind::Head,
        ComponentKind::Preview,
        ComponentKind::Body,
        ComponentKind::Container,
        ComponentKind::Section,
        ComponentKind::Row,
        ComponentKind::Column,
        ComponentKind::Heading,
        ComponentKind::Text,
        ComponentKind::Button,
        ComponentKind::Image,
        ComponentKind::Divider,
        ComponentKind::Spacer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Email => "Email",
            ComponentKind::Head => "Head",
            ComponentKind::Preview => "Preview",
            ComponentKind::Body => "Body",
            ComponentKind::Container => "Container",
            ComponentKind::Section => "Section",
            ComponentKind::Row => "Row",
            ComponentKind::Column => "Column",
            ComponentKind::Heading => "Heading",
            ComponentKind::Text => "Text",
            ComponentKind::Button => "Button",
            ComponentKind::Image => "Image",
            ComponentKind::Divider => "Divider",
            ComponentKind::Spacer => "Spacer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema entry for one component type
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub kind: ComponentKind,

    /// Prop keys the component accepts (`style` is always accepted)
    pub allowed_props: BTreeSet<&'static str>,

    /// Leaf-only components may not carry children
    pub leaf: bool,

    /// Counted by tree stats as user-editable content
    pub editable: bool,
}

impl ComponentSpec {
    fn new(kind: ComponentKind, allowed_props: &[&'static str]) -> Self {
        Self {
            kind,
            allowed_props: allowed_props.iter().copied().collect(),
            leaf: false,
            editable: false,
        }
    }

    fn leaf(mut self) -> Self {
        self.leaf = true;
        self
    }

    fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn allows_prop(&self, key: &str) -> bool {
        key == crate::node::STYLE_KEY || self.allowed_props.contains(key)
    }
}

/// Read-only catalogue of component specs, keyed by type name
#[derive(Debug, Clone)]
pub struct Registry {
    components: BTreeMap<&'static str, ComponentSpec>,
}

impl Registry {
    /// Registry with every [`ComponentKind`] and its standard schema
    pub fn standard() -> Self {
        use ComponentKind::*;

        Self::from_specs([
            ComponentSpec::new(Email, &["lang", "dir"]),
            ComponentSpec::new(Head, &["title"]),
            ComponentSpec::new(Preview, &[]).leaf(),
            ComponentSpec::new(Body, &[]),
            ComponentSpec::new(Container, &["align"]),
            ComponentSpec::new(Section, &["align", "backgroundColor"]),
            ComponentSpec::new(Row, &[]),
            ComponentSpec::new(Column, &["width", "align", "valign"]),
            ComponentSpec::new(Heading, &["level", "align"]).leaf().editable(),
            ComponentSpec::new(Text, &["align"]).leaf().editable(),
            ComponentSpec::new(Button, &["href", "target", "align"]).leaf().editable(),
            ComponentSpec::new(Image, &["src", "alt", "width", "height", "href", "align"])
                .leaf()
                .editable(),
            ComponentSpec::new(Divider, &["color"]).leaf(),
            ComponentSpec::new(Spacer, &["height"]).leaf(),
        ])
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ComponentSpec>) -> Self {
        Self {
            components: specs
                .into_iter()
                .map(|spec| (spec.kind.name(), spec))
                .collect(),
        }
    }

    pub fn get(&self, component_type: &str) -> Option<&ComponentSpec> {
        self.components.get(component_type)
    }

    pub fn kind_of(&self, component_type: &str) -> Option<ComponentKind> {
        self.get(component_type).map(|spec| spec.kind)
    }

    pub fn contains(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }

    pub fn is_editable(&self, component_type: &str) -> bool {
        self.get(component_type).map_or(false, |spec| spec.editable)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_knows_every_kind() {
        let registry = Registry::standard();
        assert_eq!(registry.len(), ComponentKind::ALL.len());

        for kind in ComponentKind::ALL {
            assert_eq!(registry.kind_of(kind.name()), Some(kind));
            assert_eq!(ComponentKind::from_name(kind.name()), Some(kind));
        }
        assert!(!registry.contains("Marquee"));
    }

    #[test]
    fn test_editable_subset() {
        let registry = Registry::standard();
        let editable: Vec<_> = ComponentKind::ALL
            .into_iter()
            .filter(|kind| registry.is_editable(kind.name()))
            .collect();

        assert_eq!(
            editable,
            vec![
                ComponentKind::Heading,
                ComponentKind::Text,
                ComponentKind::Button,
                ComponentKind::Image
            ]
        );
    }

    #[test]
    fn test_style_is_always_allowed() {
        let registry = Registry::standard();
        let divider = registry.get("Divider").unwrap();
        assert!(divider.allows_prop("style"));
        assert!(divider.allows_prop("color"));
        assert!(!divider.allows_prop("href"));
    }
}
