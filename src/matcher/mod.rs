//! Field and route matchers.

mod field;
mod route;

pub use field::should_transform;
pub use route::applies as route_applies;
