// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build and teardown of the overlay structure.
//!
//! ```text
//! host (the target)
//! ├── padding            optional
//! │   └── viewport       always present
//! │       └── content    optional
//! │           └── payload (the target's original children)
//! ├── scrollbar-horizontal > track > handle
//! └── scrollbar-vertical   > track > handle
//! ```
//!
//! Each role is [`Role::Generate`]d, [`Role::Adopt`]ed from an existing
//! element, or [`Role::Skip`]ped. Payload nodes are always moved, never
//! cloned, so node identity (and any listeners on it) survives build,
//! [`reconfigure`](Structure::reconfigure), and [`destroy`](Structure::destroy).
//!
//! Class, attribute, and style writes to nodes the engine does not own are
//! recorded in a ledger and undone on destroy; after build and destroy the
//! target's subtree is identical to what it was.

mod ledger;

use alloc::vec::Vec;
use core::fmt;

use crate::dom::Dom;
use crate::environment::ElementDefaults;
use crate::geometry::{Axis, Xy};
use crate::style;

pub(crate) use ledger::Ledger;

/// How one structural role is filled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Role<N> {
    /// Leave the role out.
    #[default]
    Skip,
    /// Create a `div` for the role.
    Generate,
    /// Use an existing element for the role.
    Adopt(N),
}

impl<N> Role<N> {
    /// `Generate` for `true`, `Skip` for `false`.
    #[must_use]
    pub fn from_bool(generate: bool) -> Self {
        if generate { Self::Generate } else { Self::Skip }
    }

    /// Returns `true` unless the role is skipped.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Skip)
    }
}

impl<N: PartialEq> Role<N> {
    /// Returns `true` if switching from `self` to `other` needs a rebuild.
    fn differs(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Skip, Self::Skip) | (Self::Generate, Self::Generate) => false,
            (Self::Adopt(a), Self::Adopt(b)) => a != b,
            _ => true,
        }
    }
}

/// Role assignment for a whole structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementsConfig<N> {
    /// The padding role.
    pub padding: Role<N>,
    /// The viewport role; `Skip` is treated as `Generate`.
    pub viewport: Role<N>,
    /// The content role.
    pub content: Role<N>,
    /// The horizontal scrollbar.
    pub scrollbar_horizontal: Role<N>,
    /// The vertical scrollbar.
    pub scrollbar_vertical: Role<N>,
}

impl<N> ElementsConfig<N> {
    /// Builds a configuration from environment defaults.
    #[must_use]
    pub fn from_defaults(defaults: &ElementDefaults) -> Self {
        Self {
            padding: Role::from_bool(defaults.padding),
            viewport: Role::Generate,
            content: Role::from_bool(defaults.content),
            scrollbar_horizontal: Role::from_bool(defaults.scrollbars),
            scrollbar_vertical: Role::from_bool(defaults.scrollbars),
        }
    }

    fn role(&self, kind: RoleKind) -> &Role<N> {
        match kind {
            RoleKind::Padding => &self.padding,
            RoleKind::Viewport => &self.viewport,
            RoleKind::Content => &self.content,
            RoleKind::ScrollbarHorizontal => &self.scrollbar_horizontal,
            RoleKind::ScrollbarVertical => &self.scrollbar_vertical,
        }
    }
}

impl<N> Default for ElementsConfig<N> {
    fn default() -> Self {
        Self::from_defaults(&ElementDefaults::default())
    }
}

/// Names a structural role in errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleKind {
    /// The padding element.
    Padding,
    /// The viewport.
    Viewport,
    /// The content element.
    Content,
    /// The horizontal scrollbar.
    ScrollbarHorizontal,
    /// The vertical scrollbar.
    ScrollbarVertical,
}

impl RoleKind {
    const ALL: [Self; 5] = [
        Self::Padding,
        Self::Viewport,
        Self::Content,
        Self::ScrollbarHorizontal,
        Self::ScrollbarVertical,
    ];
    const CHAIN: [Self; 3] = [Self::Padding, Self::Viewport, Self::Content];

    fn class(self) -> &'static str {
        match self {
            Self::Padding => style::PADDING,
            Self::Viewport => style::VIEWPORT,
            Self::Content => style::CONTENT,
            Self::ScrollbarHorizontal => style::SCROLLBAR_HORIZONTAL,
            Self::ScrollbarVertical => style::SCROLLBAR_VERTICAL,
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Padding => "padding",
            Self::Viewport => "viewport",
            Self::Content => "content",
            Self::ScrollbarHorizontal => "scrollbar-horizontal",
            Self::ScrollbarVertical => "scrollbar-vertical",
        })
    }
}

/// Why a structure could not be built.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The target is not attached to a document.
    #[error("target element is not connected to a document")]
    DetachedTarget,
    /// An adopted element cannot fill its role.
    #[error("element adopted for the {role} role is the target, one of its ancestors, or adopted twice")]
    InvalidRole {
        /// The offending role.
        role: RoleKind,
    },
}

/// The elements of one scrollbar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollbarElements<N> {
    /// The scrollbar root.
    pub scrollbar: N,
    /// The track inside it.
    pub track: N,
    /// The handle inside the track.
    pub handle: N,
}

/// A snapshot of the structure's elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Elements<N> {
    /// The target element.
    pub host: N,
    /// The padding element, if present.
    pub padding: Option<N>,
    /// The viewport.
    pub viewport: N,
    /// The content element, if present.
    pub content: Option<N>,
    /// The horizontal scrollbar, if present.
    pub scrollbar_horizontal: Option<ScrollbarElements<N>>,
    /// The vertical scrollbar, if present.
    pub scrollbar_vertical: Option<ScrollbarElements<N>>,
}

enum Origin<N> {
    Generated,
    Adopted {
        parent: Option<N>,
        next_sibling: Option<N>,
        children: Vec<N>,
    },
}

struct Slot<N> {
    node: N,
    origin: Origin<N>,
}

struct Scrollbar<N> {
    root: Slot<N>,
    track: N,
    handle: N,
}

/// A built structure around one target.
pub struct Structure<N> {
    host: N,
    padding: Option<Slot<N>>,
    viewport: Slot<N>,
    content: Option<Slot<N>>,
    scrollbars: Xy<Option<Scrollbar<N>>>,
    original_children: Vec<N>,
    config: ElementsConfig<N>,
    pub(crate) ledger: Ledger<N>,
}

impl<N: Clone + PartialEq + fmt::Debug + 'static> Structure<N> {
    /// Wraps `target` according to `config`.
    ///
    /// # Errors
    ///
    /// [`BuildError::DetachedTarget`] if the target is not connected, and
    /// [`BuildError::InvalidRole`] if an adopted element is the target, an
    /// ancestor of it, or adopted for two roles.
    pub fn build<D: Dom<Node = N>>(
        dom: &D,
        target: &N,
        config: &ElementsConfig<N>,
    ) -> Result<Self, BuildError> {
        if !dom.is_connected(target) {
            return Err(BuildError::DetachedTarget);
        }
        let config = normalize(config);
        validate(dom, target, &config)?;

        let mut ledger = Ledger::default();
        ledger.add_class(dom, target, style::HOST);
        ledger.set_attribute(dom, target, style::HOST_ATTRIBUTE, "host");

        let mut structure = Self {
            host: target.clone(),
            padding: None,
            viewport: Slot {
                node: target.clone(),
                origin: Origin::Generated,
            },
            content: None,
            scrollbars: Xy::new(None, None),
            original_children: dom.children(target),
            config: config.clone(),
            ledger,
        };
        // Adopted origins are read before anything moves.
        let origins = RoleKind::ALL.map(|kind| origin_of(dom, config.role(kind)));
        let [padding, viewport, content, horizontal, vertical] = origins;
        structure.wrap_role(dom, RoleKind::Padding, &config.padding, padding);
        structure.wrap_role(dom, RoleKind::Viewport, &config.viewport, viewport);
        structure.wrap_role(dom, RoleKind::Content, &config.content, content);
        structure.attach_scrollbar(dom, Axis::X, &config.scrollbar_horizontal, horizontal);
        structure.attach_scrollbar(dom, Axis::Y, &config.scrollbar_vertical, vertical);

        tracing::debug!(
            host = ?structure.host,
            padding = structure.padding.is_some(),
            content = structure.content.is_some(),
            "structure built"
        );
        Ok(structure)
    }

    /// Returns the host (the target).
    #[inline]
    #[must_use]
    pub fn host(&self) -> &N {
        &self.host
    }

    /// Returns the padding element, if any.
    #[must_use]
    pub fn padding(&self) -> Option<&N> {
        self.padding.as_ref().map(|s| &s.node)
    }

    /// Returns the viewport.
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> &N {
        &self.viewport.node
    }

    /// Returns the content element, if any.
    #[must_use]
    pub fn content(&self) -> Option<&N> {
        self.content.as_ref().map(|s| &s.node)
    }

    /// Returns the innermost role, which holds the payload.
    #[must_use]
    pub fn innermost(&self) -> &N {
        self.content().unwrap_or(&self.viewport.node)
    }

    /// Returns the element that absorbs host padding: padding, else viewport.
    #[must_use]
    pub fn padding_target(&self) -> &N {
        self.padding().unwrap_or(&self.viewport.node)
    }

    /// Returns the root element of one scrollbar.
    #[must_use]
    pub fn scrollbar(&self, axis: Axis) -> Option<&N> {
        self.scrollbars.get(axis).as_ref().map(|s| &s.root.node)
    }

    /// Returns the handle element of one scrollbar.
    #[must_use]
    pub fn scrollbar_handle(&self, axis: Axis) -> Option<&N> {
        self.scrollbars.get(axis).as_ref().map(|s| &s.handle)
    }

    /// Returns the active role configuration.
    #[must_use]
    pub fn config(&self) -> &ElementsConfig<N> {
        &self.config
    }

    /// Returns a snapshot of every element.
    #[must_use]
    pub fn elements(&self) -> Elements<N> {
        let scrollbar = |axis| {
            self.scrollbars.get(axis).as_ref().map(|s: &Scrollbar<N>| ScrollbarElements {
                scrollbar: s.root.node.clone(),
                track: s.track.clone(),
                handle: s.handle.clone(),
            })
        };
        Elements {
            host: self.host.clone(),
            padding: self.padding().cloned(),
            viewport: self.viewport.node.clone(),
            content: self.content().cloned(),
            scrollbar_horizontal: scrollbar(Axis::X),
            scrollbar_vertical: scrollbar(Axis::Y),
        }
    }

    /// Returns `true` if `node` is one of the structure's own elements.
    #[must_use]
    pub fn is_structural(&self, node: &N) -> bool {
        *node == self.host
            || self.chain_nodes().any(|n| n == node)
            || self.scrollbar_nodes().any(|n| n == node)
    }

    /// Moves to a new role configuration, touching only roles that differ.
    ///
    /// Returns `Ok(false)` when nothing differs.
    ///
    /// # Errors
    ///
    /// [`BuildError::InvalidRole`] if an adopted element cannot fill its role;
    /// the structure is unchanged in that case.
    pub fn reconfigure<D: Dom<Node = N>>(
        &mut self,
        dom: &D,
        config: &ElementsConfig<N>,
    ) -> Result<bool, BuildError> {
        let config = normalize(config);
        let changed: Vec<RoleKind> = RoleKind::ALL
            .into_iter()
            .filter(|k| self.config.role(*k).differs(config.role(*k)))
            .collect();
        if changed.is_empty() {
            return Ok(false);
        }
        validate(dom, &self.host, &config)?;
        let mut origins = RoleKind::ALL.map(|kind| {
            if changed.contains(&kind) {
                origin_of(dom, config.role(kind))
            } else {
                Origin::Generated
            }
        });

        // Unwrap innermost first so each unwrap lands payload in a live parent.
        for kind in RoleKind::CHAIN.into_iter().rev() {
            if changed.contains(&kind) {
                self.unwrap_role(dom, kind);
            }
        }
        for (i, kind) in RoleKind::ALL.into_iter().enumerate() {
            if !changed.contains(&kind) {
                continue;
            }
            let origin = core::mem::replace(&mut origins[i], Origin::Generated);
            match kind {
                RoleKind::ScrollbarHorizontal => {
                    self.detach_scrollbar(dom, Axis::X);
                    self.attach_scrollbar(dom, Axis::X, config.role(kind), origin);
                }
                RoleKind::ScrollbarVertical => {
                    self.detach_scrollbar(dom, Axis::Y);
                    self.attach_scrollbar(dom, Axis::Y, config.role(kind), origin);
                }
                _ => self.wrap_role(dom, kind, config.role(kind), origin),
            }
        }

        tracing::debug!(host = ?self.host, ?changed, "structure reconfigured");
        self.config = config;
        Ok(true)
    }

    /// Tears the structure down, restoring the target's original subtree.
    ///
    /// Original children still inside the structure move back in order;
    /// nodes added to the innermost role after build follow them. Nodes the
    /// user moved elsewhere are left where they are.
    pub fn destroy<D: Dom<Node = N>>(mut self, dom: &D) {
        let adopted_children: Vec<N> = self
            .slots()
            .filter_map(|s| match &s.origin {
                Origin::Adopted { children, .. } => Some(children.clone()),
                Origin::Generated => None,
            })
            .flatten()
            .collect();
        let extras: Vec<N> = dom
            .children(self.innermost())
            .into_iter()
            .filter(|c| {
                !self.original_children.contains(c)
                    && !adopted_children.contains(c)
                    && !self.is_structural(c)
            })
            .collect();

        // Adopted elements get their own children back first, so moving the
        // payload out below leaves exactly those behind.
        for slot in self.slots() {
            if let Origin::Adopted { children, .. } = &slot.origin {
                for child in children {
                    if dom.contains(&self.host, child) {
                        dom.append_child(&slot.node, child);
                    }
                }
            }
        }
        for child in &self.original_children {
            if dom.contains(&self.host, child) {
                dom.append_child(&self.host, child);
            }
        }
        for extra in &extras {
            dom.append_child(&self.host, extra);
        }

        for axis in [Axis::X, Axis::Y] {
            self.detach_scrollbar(dom, axis);
        }
        for slot in [self.content.take(), self.padding.take()].into_iter().flatten() {
            self.release_slot(dom, slot);
        }
        let viewport = core::mem::replace(
            &mut self.viewport,
            Slot {
                node: self.host.clone(),
                origin: Origin::Generated,
            },
        );
        self.release_slot(dom, viewport);

        self.ledger.restore(dom);
        tracing::debug!(host = ?self.host, "structure destroyed");
    }

    fn slots(&self) -> impl Iterator<Item = &Slot<N>> {
        self.padding
            .iter()
            .chain(core::iter::once(&self.viewport))
            .chain(self.content.iter())
            .chain(self.scrollbars.x.iter().map(|s| &s.root))
            .chain(self.scrollbars.y.iter().map(|s| &s.root))
    }

    fn chain_nodes(&self) -> impl Iterator<Item = &N> {
        self.padding
            .iter()
            .chain(core::iter::once(&self.viewport))
            .chain(self.content.iter())
            .map(|s| &s.node)
    }

    fn scrollbar_nodes(&self) -> impl Iterator<Item = &N> {
        [&self.scrollbars.x, &self.scrollbars.y]
            .into_iter()
            .flatten()
            .flat_map(|s| [&s.root.node, &s.track, &s.handle])
    }

    /// Returns the nearest present chain element outside `kind`, or the host.
    fn outer_of(&self, kind: RoleKind) -> N {
        let padding = self.padding().cloned();
        let viewport = (self.viewport.node != self.host).then(|| self.viewport.node.clone());
        let candidates = match kind {
            RoleKind::Padding => [None, None],
            RoleKind::Viewport => [None, padding],
            _ => [viewport, padding],
        };
        candidates
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_else(|| self.host.clone())
    }

    fn wrap_role<D: Dom<Node = N>>(&mut self, dom: &D, kind: RoleKind, role: &Role<N>, origin: Origin<N>) {
        let node = match role {
            Role::Skip => return,
            Role::Generate => dom.create_element("div"),
            Role::Adopt(node) => node.clone(),
        };
        let parent = self.outer_of(kind);

        // The inner chain element, if present, is payload like any other.
        let payload: Vec<N> = dom
            .children(&parent)
            .into_iter()
            .filter(|c| *c != node && !self.scrollbar_nodes().any(|s| s == c))
            .collect();
        dom.insert_before(&parent, &node, payload.first());
        for child in &payload {
            dom.append_child(&node, child);
        }
        self.ledger.add_class(dom, &node, kind.class());
        if kind == RoleKind::Viewport && dom.attribute(&node, "tabindex").is_none() {
            self.ledger.set_attribute(dom, &node, "tabindex", "-1");
        }

        let slot = Slot { node, origin };
        match kind {
            RoleKind::Padding => self.padding = Some(slot),
            RoleKind::Viewport => self.viewport = slot,
            RoleKind::Content => self.content = Some(slot),
            RoleKind::ScrollbarHorizontal | RoleKind::ScrollbarVertical => {}
        }
    }

    fn unwrap_role<D: Dom<Node = N>>(&mut self, dom: &D, kind: RoleKind) {
        let slot = match kind {
            RoleKind::Padding => self.padding.take(),
            RoleKind::Content => self.content.take(),
            RoleKind::Viewport => Some(core::mem::replace(
                &mut self.viewport,
                Slot {
                    node: self.host.clone(),
                    origin: Origin::Generated,
                },
            )),
            RoleKind::ScrollbarHorizontal | RoleKind::ScrollbarVertical => None,
        };
        let Some(slot) = slot else {
            return;
        };
        let Some(parent) = dom.parent(&slot.node) else {
            self.release_slot(dom, slot);
            return;
        };
        let keep: &[N] = match &slot.origin {
            Origin::Adopted { children, .. } => children,
            Origin::Generated => &[],
        };
        for child in dom.children(&slot.node) {
            if !keep.contains(&child) {
                dom.insert_before(&parent, &child, Some(&slot.node));
            }
        }
        self.release_slot(dom, slot);
    }

    /// Removes a generated slot or returns an adopted one to its origin.
    fn release_slot<D: Dom<Node = N>>(&mut self, dom: &D, slot: Slot<N>) {
        if slot.node == self.host {
            return;
        }
        match slot.origin {
            Origin::Generated => {
                dom.remove(&slot.node);
                self.ledger.forget(&slot.node);
            }
            Origin::Adopted {
                parent,
                next_sibling,
                ..
            } => {
                self.ledger.restore_node(dom, &slot.node);
                match parent {
                    // Nodes that started inside the target were put back by
                    // the payload pass.
                    Some(parent)
                        if parent == self.host
                            && dom.parent(&slot.node).as_ref() == Some(&self.host) => {}
                    Some(parent) => {
                        let reference =
                            next_sibling.filter(|s| dom.parent(s).as_ref() == Some(&parent));
                        dom.insert_before(&parent, &slot.node, reference.as_ref());
                    }
                    None => dom.remove(&slot.node),
                }
            }
        }
    }

    fn attach_scrollbar<D: Dom<Node = N>>(&mut self, dom: &D, axis: Axis, role: &Role<N>, origin: Origin<N>) {
        let root = match role {
            Role::Skip => return,
            Role::Generate => dom.create_element("div"),
            Role::Adopt(node) => node.clone(),
        };
        let kind = match axis {
            Axis::X => RoleKind::ScrollbarHorizontal,
            Axis::Y => RoleKind::ScrollbarVertical,
        };
        self.ledger.add_class(dom, &root, style::SCROLLBAR);
        self.ledger.add_class(dom, &root, kind.class());
        let track = dom.create_element("div");
        dom.add_class(&track, style::SCROLLBAR_TRACK);
        let handle = dom.create_element("div");
        dom.add_class(&handle, style::SCROLLBAR_HANDLE);
        dom.append_child(&track, &handle);
        dom.append_child(&root, &track);
        dom.append_child(&self.host, &root);

        let scrollbar = Scrollbar {
            root: Slot { node: root, origin },
            track,
            handle,
        };
        match axis {
            Axis::X => self.scrollbars.x = Some(scrollbar),
            Axis::Y => self.scrollbars.y = Some(scrollbar),
        }
    }

    fn detach_scrollbar<D: Dom<Node = N>>(&mut self, dom: &D, axis: Axis) {
        let taken = match axis {
            Axis::X => self.scrollbars.x.take(),
            Axis::Y => self.scrollbars.y.take(),
        };
        let Some(scrollbar) = taken else {
            return;
        };
        dom.remove(&scrollbar.track);
        let origin_is_host = matches!(
            &scrollbar.root.origin,
            Origin::Adopted { parent: Some(p), .. } if *p == self.host
        );
        if origin_is_host {
            // Restore position among the original children.
            self.ledger.restore_node(dom, &scrollbar.root.node);
        } else {
            self.release_slot(dom, scrollbar.root);
        }
    }
}

fn origin_of<D: Dom>(dom: &D, role: &Role<D::Node>) -> Origin<D::Node> {
    match role {
        Role::Adopt(node) => Origin::Adopted {
            parent: dom.parent(node),
            next_sibling: dom.next_sibling(node),
            children: dom.children(node),
        },
        Role::Skip | Role::Generate => Origin::Generated,
    }
}

/// The viewport is mandatory.
fn normalize<N: Clone>(config: &ElementsConfig<N>) -> ElementsConfig<N> {
    let mut config = config.clone();
    if matches!(config.viewport, Role::Skip) {
        config.viewport = Role::Generate;
    }
    config
}

fn validate<D: Dom>(dom: &D, target: &D::Node, config: &ElementsConfig<D::Node>) -> Result<(), BuildError> {
    let mut seen: Vec<&D::Node> = Vec::new();
    for kind in RoleKind::ALL {
        if let Role::Adopt(node) = config.role(kind) {
            if dom.contains(node, target) || seen.contains(&node) {
                return Err(BuildError::InvalidRole { role: kind });
            }
            seen.push(node);
        }
    }
    Ok(())
}

impl<N: fmt::Debug> fmt::Debug for Structure<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("host", &self.host)
            .field("padding", &self.padding.as_ref().map(|s| &s.node))
            .field("viewport", &self.viewport.node)
            .field("content", &self.content.as_ref().map(|s| &s.node))
            .field("scrollbars", &(self.scrollbars.x.is_some(), self.scrollbars.y.is_some()))
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::vec;

    use super::*;
    use crate::memory::{MemoryDom, NodeId};

    /// Serializes a subtree with sorted attributes, for equality checks.
    fn snapshot(dom: &MemoryDom, node: NodeId) -> String {
        let store = dom.store();
        let mut attrs = store.attributes[node.index() as usize].clone();
        attrs.sort();
        let mut out = format!("<{}", store.tag(node));
        for (name, value) in attrs {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        let children: Vec<NodeId> = store.children(node).collect();
        drop(store);
        for child in children {
            out.push_str(&snapshot(dom, child));
        }
        out.push_str(&format!("{}</>", dom.store().text(node)));
        out
    }

    fn target_with(dom: &MemoryDom, count: usize) -> (NodeId, Vec<NodeId>) {
        let target = dom.create_element("section");
        dom.append_child(&dom.body(), &target);
        dom.set_attribute(&target, "class", "user");
        let children: Vec<NodeId> = (0..count)
            .map(|i| {
                let c = dom.create_element("p");
                dom.set_attribute(&c, "id", &format!("c{i}"));
                dom.append_child(&target, &c);
                c
            })
            .collect();
        (target, children)
    }

    #[test]
    fn default_build_nests_payload_in_viewport() {
        let dom = MemoryDom::new();
        let (target, kids) = target_with(&dom, 2);
        let structure = Structure::build(&dom, &target, &ElementsConfig::default()).unwrap();

        let padding = *structure.padding().unwrap();
        let viewport = *structure.viewport();
        assert_eq!(dom.parent(&padding), Some(target), "padding sits in the host");
        assert_eq!(dom.parent(&viewport), Some(padding), "viewport sits in padding");
        assert_eq!(dom.children(&viewport), kids, "payload moved, order kept");
        assert!(dom.has_class(&target, style::HOST), "host class");
        assert_eq!(dom.attribute(&target, style::HOST_ATTRIBUTE).as_deref(), Some("host"), "host attribute");
        assert_eq!(dom.attribute(&viewport, "tabindex").as_deref(), Some("-1"), "viewport focusable");

        let host_children = dom.children(&target);
        assert_eq!(host_children.len(), 3, "padding and two scrollbars");
        let hbar = structure.scrollbar(Axis::X).unwrap();
        assert!(dom.has_class(hbar, style::SCROLLBAR_HORIZONTAL), "horizontal scrollbar class");
        let handle = structure.scrollbar_handle(Axis::X).unwrap();
        assert!(dom.has_class(handle, style::SCROLLBAR_HANDLE), "handle class");
    }

    #[test]
    fn build_then_destroy_restores_subtree() {
        let dom = MemoryDom::new();
        let (target, _) = target_with(&dom, 2);
        dom.set_style(&target, "color", "red");
        let before = snapshot(&dom, target);

        let config = ElementsConfig {
            content: Role::Generate,
            ..ElementsConfig::default()
        };
        let structure = Structure::build(&dom, &target, &config).unwrap();
        assert!(structure.content().is_some(), "content generated");
        assert_ne!(snapshot(&dom, target), before, "structure is visible");
        structure.destroy(&dom);
        assert_eq!(snapshot(&dom, target), before, "round trip is exact");
    }

    #[test]
    fn adopted_elements_return_to_their_nesting() {
        let dom = MemoryDom::new();
        let (target, kids) = target_with(&dom, 2);
        let adopted = dom.create_element("div");
        let own = dom.create_element("span");
        dom.append_child(&adopted, &own);
        dom.insert_before(&target, &adopted, Some(&kids[1]));
        let before = snapshot(&dom, target);

        let config = ElementsConfig {
            viewport: Role::Adopt(adopted),
            content: Role::Generate,
            ..ElementsConfig::default()
        };
        let structure = Structure::build(&dom, &target, &config).unwrap();
        assert_eq!(*structure.viewport(), adopted, "adopted in place");
        let content = *structure.content().unwrap();
        assert_eq!(dom.parent(&content), Some(adopted), "content generated inside");
        assert!(dom.children(&content).contains(&kids[0]), "payload moved into content");
        structure.destroy(&dom);
        assert_eq!(snapshot(&dom, target), before, "adopted element and its child restored");
    }

    #[test]
    fn late_additions_move_to_the_end_of_the_target() {
        let dom = MemoryDom::new();
        let (target, kids) = target_with(&dom, 1);
        let structure = Structure::build(&dom, &target, &ElementsConfig::default()).unwrap();
        let late = dom.create_element("aside");
        dom.append_child(structure.innermost(), &late);
        structure.destroy(&dom);
        assert_eq!(dom.children(&target), vec![kids[0], late], "original then added");
    }

    #[test]
    fn reconfigure_moves_payload_without_recreating_it() {
        let dom = MemoryDom::new();
        let (target, kids) = target_with(&dom, 2);
        let mut structure = Structure::build(&dom, &target, &ElementsConfig::default()).unwrap();
        let viewport = *structure.viewport();

        let with_content = ElementsConfig {
            content: Role::Generate,
            ..ElementsConfig::default()
        };
        assert_eq!(structure.reconfigure(&dom, &with_content), Ok(true), "content added");
        let content = *structure.content().unwrap();
        assert_eq!(*structure.viewport(), viewport, "viewport untouched");
        assert_eq!(dom.parent(&content), Some(viewport), "content inside viewport");
        assert_eq!(dom.children(&content), kids, "same payload nodes");

        let without_padding = ElementsConfig {
            padding: Role::Skip,
            ..with_content.clone()
        };
        assert_eq!(structure.reconfigure(&dom, &without_padding), Ok(true), "padding removed");
        assert_eq!(dom.parent(&viewport), Some(target), "viewport moved up");
        assert_eq!(dom.children(&content), kids, "payload still in content");

        assert_eq!(structure.reconfigure(&dom, &without_padding), Ok(false), "no-op reconfigure");
        assert_eq!(
            structure.reconfigure(&dom, &ElementsConfig::default()),
            Ok(true),
            "back to defaults"
        );
        assert_eq!(structure.content(), None, "content removed");
        assert_eq!(dom.children(&viewport), kids, "payload back in viewport");
    }

    #[test]
    fn invalid_targets_and_roles_are_rejected() {
        let dom = MemoryDom::new();
        let detached = dom.create_element("div");
        assert_eq!(
            Structure::build(&dom, &detached, &ElementsConfig::default()).unwrap_err(),
            BuildError::DetachedTarget,
            "detached target"
        );

        let (target, kids) = target_with(&dom, 1);
        let self_adopt = ElementsConfig {
            viewport: Role::Adopt(target),
            ..ElementsConfig::default()
        };
        assert_eq!(
            Structure::build(&dom, &target, &self_adopt).unwrap_err(),
            BuildError::InvalidRole {
                role: RoleKind::Viewport
            },
            "target cannot fill a role"
        );
        let ancestor = ElementsConfig {
            content: Role::Adopt(dom.body()),
            ..ElementsConfig::default()
        };
        assert!(Structure::build(&dom, &target, &ancestor).is_err(), "ancestor rejected");
        let twice = ElementsConfig {
            padding: Role::Adopt(kids[0]),
            viewport: Role::Adopt(kids[0]),
            ..ElementsConfig::default()
        };
        assert_eq!(
            Structure::build(&dom, &target, &twice).unwrap_err(),
            BuildError::InvalidRole {
                role: RoleKind::Viewport
            },
            "one element, two roles"
        );
        assert!(!dom.has_class(&target, style::HOST), "failed builds write nothing");
    }

    #[test]
    fn skipped_viewport_is_generated() {
        let dom = MemoryDom::new();
        let (target, _) = target_with(&dom, 0);
        let config = ElementsConfig {
            padding: Role::Skip,
            viewport: Role::Skip,
            scrollbar_horizontal: Role::Skip,
            scrollbar_vertical: Role::Skip,
            ..ElementsConfig::default()
        };
        let structure = Structure::build(&dom, &target, &config).unwrap();
        assert_ne!(*structure.viewport(), target, "viewport exists");
        assert_eq!(dom.children(&target), vec![*structure.viewport()], "only the viewport");
        assert_eq!(structure.padding_target(), structure.viewport(), "viewport absorbs padding");
    }
}
