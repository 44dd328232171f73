// ABOUTME: Notification routing and dispatch for Stagegate
// ABOUTME: Routing matrix, message templates, dispatcher, and overdue/review sweeps

pub mod dispatcher;
pub mod routing;
pub mod templates;

pub use dispatcher::NotificationDispatcher;
pub use routing::{
    routing_matrix, ResolvedRoute, RouteEntry, RouteTarget, RoutingMatrix, PROJECT_REVIEW_TEAM,
};
