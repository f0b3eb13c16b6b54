//! # TestJunction — headless integration test harness
//!
//! Provides a fluent builder that wraps `bevy::app::App` +
//! `JunctionControlPlugin` for running junction scenarios without a window
//! or a host traffic simulation.

mod assertions;
mod queries;
mod setup;

use bevy::app::App;
use bevy::prelude::*;

use crate::JunctionControlPlugin;

/// A headless Bevy App wrapping `JunctionControlPlugin` for integration testing.
///
/// Use builder methods to lay out nodes and signs, then call `tick()` to
/// advance the simulation and query/assert on the resulting resources.
pub struct TestJunction {
    app: App,
}

impl TestJunction {
    /// Create an empty network with every junction resource at its default.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(JunctionControlPlugin);
        app.update();
        Self { app }
    }

    /// Access the underlying Bevy `App`.
    pub fn app(&mut self) -> &mut App {
        &mut self.app
    }
}

impl Default for TestJunction {
    fn default() -> Self {
        Self::new()
    }
}
