//! Assertion helpers for `TestJunction` integration tests.

use bevy::prelude::*;

use crate::network::{NodeId, SegmentId};
use crate::stock_lights::LightPair;
use crate::traffic_lights::LightSource;

use super::TestJunction;

impl TestJunction {
    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    /// Assert that a resource of type `T` exists in the world.
    pub fn assert_resource_exists<T: Resource>(&self) {
        assert!(
            self.app.world().get_resource::<T>().is_some(),
            "Expected resource {} to exist",
            std::any::type_name::<T>()
        );
    }

    pub fn assert_light_source(&self, node: u16, segment: u16, expected: LightSource) {
        let actual = self
            .lights()
            .light_source(NodeId(node), SegmentId(segment));
        assert_eq!(
            actual, expected,
            "node {node} segment {segment}: expected {expected:?}, got {actual:?}"
        );
    }

    pub fn assert_override(&self, node: u16, segment: u16, expected: LightPair) {
        let actual = self
            .lights()
            .get_override_color(NodeId(node), SegmentId(segment));
        assert_eq!(
            actual,
            Some(expected),
            "node {node} segment {segment}: unexpected override"
        );
    }

    pub fn assert_no_override(&self, node: u16, segment: u16) {
        let actual = self
            .lights()
            .get_override_color(NodeId(node), SegmentId(segment));
        assert!(
            actual.is_none(),
            "node {node} segment {segment}: expected no override, got {actual:?}"
        );
    }

    pub fn assert_may_proceed(&self, vehicle: u32, expected: bool) {
        let decision = self
            .vehicle_decision(vehicle)
            .unwrap_or_else(|| panic!("no decision for vehicle {vehicle}"));
        assert_eq!(
            decision.may_proceed, expected,
            "vehicle {vehicle}: unexpected decision {decision:?}"
        );
    }
}
