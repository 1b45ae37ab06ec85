//! Runtime core: periodic lifecycle.
//!
//! The public API from this module is [`PeriodicTask`] (built through
//! [`PeriodicTaskBuilder`]) and the free-standing [`tick_loop`] engine.
//!
//! Internal modules:
//! - [`config`]: clock settings and their validation;
//! - [`builder`]: fallible construction of a periodic task;
//! - [`periodic`]: start/stop/wait state machine around one ticker;
//! - [`tick_loop`]: turns ticks into concurrent invocations until a terminal condition.

mod builder;
mod config;
mod periodic;
mod tick_loop;

pub use builder::PeriodicTaskBuilder;
pub use config::Config;
pub use periodic::PeriodicTask;
pub use tick_loop::tick_loop;
