use bevy::prelude::*;

use crate::SaveableAppExt;

use super::controller::TrafficLightControl;

pub struct TrafficLightsPlugin;

impl Plugin for TrafficLightsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrafficLightControl>()
            .register_saveable::<TrafficLightControl>();
    }
}
