//! The `NetworkOwnership` component: names which node holds authoritative
//! state for an entity.

use fdp_component::Component;
use fdp_net::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOwnership {
    pub local_owner: NodeId,
}

impl NetworkOwnership {
    #[must_use]
    pub fn owned_by(node: NodeId) -> Self {
        Self { local_owner: node }
    }
}

impl Component for NetworkOwnership {
    fn type_name() -> &'static str {
        "NetworkOwnership"
    }
}
