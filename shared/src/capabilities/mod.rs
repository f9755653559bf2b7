//! Crux capabilities.
//!
//! We use Crux's built-in Render capability and the `crux_http` Http
//! capability directly; the core needs nothing beyond triggering view
//! updates and fetching the event feed.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;
use crate::App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
