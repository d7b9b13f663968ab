use crate::ast::{ElementNode, TemplateIR, TemplateNode, TextNode};

/// The TemplateVisitor trait is the single traversal mechanism for template trees.
///
/// Rules:
/// 1. Traversal is depth-first in document order.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers MUST call the matching `walk_*` function to continue
///    traversal unless pruning is intended.
/// 4. Visitors only inspect nodes; the tree is never mutated during a walk.
pub trait TemplateVisitor {
    fn visit_root(&mut self, root: &TemplateIR) {
        walk_root(self, root);
    }

    fn visit_node(&mut self, node: &TemplateNode) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &ElementNode) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &TextNode) {
        // Leaf node, nothing to walk by default
    }

    fn visit_children(&mut self, children: &[TemplateNode]) {
        walk_children(self, children);
    }
}

pub fn walk_root<V: TemplateVisitor + ?Sized>(visitor: &mut V, root: &TemplateIR) {
    visitor.visit_children(&root.nodes);
}

pub fn walk_children<V: TemplateVisitor + ?Sized>(visitor: &mut V, children: &[TemplateNode]) {
    for node in children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: TemplateVisitor + ?Sized>(visitor: &mut V, node: &TemplateNode) {
    match node {
        TemplateNode::Element(el) => visitor.visit_element(el),
        TemplateNode::Text(t) => visitor.visit_text(t),
    }
}

pub fn walk_element<V: TemplateVisitor + ?Sized>(visitor: &mut V, element: &ElementNode) {
    visitor.visit_children(&element.children);
}
