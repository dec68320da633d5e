//! Interactive element selection for the inspection overlay.
//!
//! [`ScopingListener`] turns raw document mouse activity into debounced,
//! resolved selector paths; [`InspectController`] starts and stops it from the
//! inspect store and routes each resolved click to the handler of the active
//! [`InspectMode`].

pub mod configuration;
pub mod error;
pub mod inspect_controller;
pub mod inspect_mode;
pub mod scoping_listener;
pub mod scoping_store;
pub mod store;
pub mod timers;

pub use configuration::{InspectConfigurationFactory, InspectHandler};
pub use error::{InspectError, Result};
pub use inspect_controller::{ChangeInspectMode, InspectController};
pub use inspect_mode::{InspectMode, InspectStoreData};
pub use scoping_listener::{
    ClickResolved, HoverResolved, ScopingControl, ScopingListener, ScopingOptions,
    DEFAULT_CONTAINER_ID,
};
pub use scoping_store::{ScopingSelectorKind, ScopingStore, ScopingStoreData};
pub use store::{BaseStore, SimpleStore, StoreListener, Subscription};
pub use timers::{ManualTimers, TimeoutId, WindowUtils};
