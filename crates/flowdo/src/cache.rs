use flowcanvas::lock::locked_nodes;
use flowcanvas::route::route_edges;
use flowcanvas::{MinimapProjection, NodeId, Route};
use std::collections::HashSet;

use crate::store::Store;
use crate::versioned::Memoized;

/// Values derived from the graph, recomputed when its revision moves.
pub struct Cache {
    pub routes: Memoized<Store, u64, Vec<Route>>,
    pub locked: Memoized<Store, u64, HashSet<NodeId>>,
    pub minimap: Memoized<Store, u64, Option<MinimapProjection>>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        let routes = Memoized::new(
            |s: &Store| s.graph.revision(),
            |s: &Store| route_edges(s.graph.nodes(), s.graph.edges()),
        );

        let locked = Memoized::new(
            |s: &Store| s.graph.revision(),
            |s: &Store| locked_nodes(s.graph.nodes(), s.graph.edges()),
        );

        let minimap = Memoized::new(
            |s: &Store| s.graph.revision(),
            |s: &Store| MinimapProjection::new(s.graph.nodes(), &s.config.canvas.minimap),
        );

        Self {
            routes,
            locked,
            minimap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::defaults::initial_document;
    use flowcanvas::WireStatus;

    #[test]
    fn test_routes_follow_graph_revision() {
        let mut store = Store::new(AppConfig::default());
        store.restore(initial_document());
        let mut cache = Cache::new();

        assert_eq!(cache.routes.get(&store).len(), 4);
        assert!(cache.routes.get(&store).iter().all(|r| r.status == WireStatus::Locked));
        assert_eq!(cache.routes.version(), 1);

        store.graph.toggle_complete(&NodeId::from("1")).unwrap();
        let routes = cache.routes.get(&store);
        let e1 = routes.iter().find(|r| r.edge.as_str() == "e1").unwrap();
        assert_eq!(e1.status, WireStatus::Active);
        assert_eq!(cache.routes.version(), 2);
        assert!(!cache.locked.get(&store).contains(&NodeId::from("2")));
        assert!(cache.minimap.get(&store).is_some());
    }
}
