//! # Event Bus Module
//!
//! Publish/subscribe channel between a viewer session and its host.
//!
//! ```rust,ignore
//! use artmap_core::event_bus::{EventBus, EventCategory, EventFilter, ViewerEvent};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Error]),
//!     |event| eprintln!("{}", event.description()),
//! );
//! bus.publish(ViewerEvent::DetailClosed).ok();
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
