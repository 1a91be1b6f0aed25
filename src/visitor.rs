//! The visitor side of genome-node double dispatch.
//!
//! A [`NodeVisitor`] declares one method per node variant, each defaulted
//! to a no-op. Concrete visitors override only the variants they care
//! about; [`crate::node::Node::accept`] picks the right one at runtime.
//! Visitors that need to emit more than one node per node consumed (e.g.
//! `inter-feature`, `select`) stage their output in an internal queue and
//! let the owning stream drain it between upstream pulls.

use crate::error::StreamResult;
use crate::node::Node;

pub trait NodeVisitor {
    fn visit_feature(&mut self, _node: &Node) -> StreamResult<()> {
        Ok(())
    }

    fn visit_region(&mut self, _node: &Node) -> StreamResult<()> {
        Ok(())
    }

    fn visit_sequence(&mut self, _node: &Node) -> StreamResult<()> {
        Ok(())
    }

    fn visit_comment(&mut self, _node: &Node) -> StreamResult<()> {
        Ok(())
    }

    fn visit_meta(&mut self, _node: &Node) -> StreamResult<()> {
        Ok(())
    }
}
