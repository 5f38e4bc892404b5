use std::cmp::Ordering;

use tracing::info;

use super::{Camera, TileMap, Unit, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    LeftClick,
    RightClick,
}

/// Pointer event in screen coordinates, as delivered by the window layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub x: f32,
    pub y: f32,
    pub kind: MouseEventKind,
}

/// One loaded level: a tile map plus the units standing on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub tile_map: TileMap,
    pub units: Vec<Unit>,
}

/// Composes one scenario with the camera and steps everything per tick.
///
/// The surface width captured at construction is the reference width the
/// map is laid out against. It never changes afterwards; window resizes
/// move the camera viewport, not the world.
#[derive(Debug)]
pub struct GameSession {
    scenario: Scenario,
    camera: Camera,
    surface_width: f32,
}

impl GameSession {
    pub fn new(scenario: Scenario, camera: Camera, surface_width: f32) -> Self {
        Self {
            scenario,
            camera,
            surface_width,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn scenario_mut(&mut self) -> &mut Scenario {
        &mut self.scenario
    }

    pub fn surface_width(&self) -> f32 {
        self.surface_width
    }

    pub fn selected_unit(&self) -> Option<&Unit> {
        self.scenario.units.iter().find(|unit| unit.is_selected())
    }

    /// Lays the map out against the reference surface and hands its bounds
    /// to the camera.
    pub fn start(&mut self) {
        self.scenario.tile_map.assign_layout(self.surface_width);
        self.camera
            .set_world_bounds(self.scenario.tile_map.world_bounds());
        info!(
            scenario = %self.scenario.name,
            rows = self.scenario.tile_map.rows(),
            cols = self.scenario.tile_map.cols(),
            unit_count = self.scenario.units.len(),
            "scenario_loaded"
        );
    }

    /// Swaps in a new scenario. The camera value carries over; only its
    /// world bounds are re-applied from the new map.
    pub fn load_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
        self.start();
    }

    /// One simulation tick: tile animation sync and layout first, then units
    /// in ascending-Y order (unit id breaks ties) each advance their clock
    /// and integrate movement. The resulting unit order is also the draw and
    /// click-forwarding order until the next tick.
    pub fn update_session(&mut self, delta_seconds: f32) {
        self.scenario.tile_map.update(delta_seconds);
        self.scenario.units.sort_by(|a, b| {
            a.sprite
                .position
                .y
                .partial_cmp(&b.sprite.position.y)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        for unit in &mut self.scenario.units {
            unit.advance_animation(delta_seconds);
            unit.update_movement(delta_seconds);
        }
    }

    /// Converts a left click to world coordinates through the camera and
    /// forwards it to every unit. Other pointer events are ignored.
    pub fn handle_mouse_event(&mut self, event: MouseEvent) {
        if event.kind != MouseEventKind::LeftClick {
            return;
        }
        let world = self.camera.screen_to_world(Vec2 {
            x: event.x,
            y: event.y,
        });
        let Scenario { tile_map, units, .. } = &mut self.scenario;
        for unit in units.iter_mut() {
            unit.on_click(world, tile_map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::{
        AnimationClock, GridPos, Mobility, Sprite, Tile, UnitId, WorldBounds,
    };

    fn ocean_tile(frames: u32, cycle_seconds: f32) -> Tile {
        Tile::new(Sprite::new("ocean", 64, 32, AnimationClock::new(frames, cycle_seconds)))
            .navigable(true)
    }

    fn ocean_scenario(name: &str) -> Scenario {
        let tiles = vec![ocean_tile(4, 0.4); 4];
        Scenario {
            name: name.to_string(),
            tile_map: TileMap::new(2, 2, 64, 32, tiles).unwrap(),
            units: Vec::new(),
        }
    }

    fn skiff(id: u64, x: f32, y: f32) -> Unit {
        let mut sprite = Sprite::new("skiff", 32, 48, AnimationClock::new(1, 0.0));
        sprite.position = Vec2 { x, y };
        Unit::new(UnitId(id), sprite, 40.0, Mobility::Navigator)
    }

    fn started_session(scenario: Scenario) -> GameSession {
        let mut session = GameSession::new(scenario, Camera::new(100.0, 50.0), 640.0);
        session.start();
        session
    }

    #[test]
    fn start_hands_map_bounds_to_the_camera() {
        let session = started_session(ocean_scenario("strait"));
        assert_eq!(
            session.camera().bounds(),
            WorldBounds {
                min_x: 192.0,
                min_y: -16.0,
                max_x: 320.0,
                max_y: 48.0,
            }
        );
    }

    #[test]
    fn shared_ocean_tiles_advance_in_lockstep_on_the_cycle_boundaries() {
        let mut session = started_session(ocean_scenario("strait"));
        let expected = [(1, 0.05), (3, 0.0), (0, 0.05)];
        for (frame, carry) in expected {
            session.update_session(0.15);
            for tile in session.scenario().tile_map.tiles() {
                assert_eq!(tile.sprite.clock.current_frame(), frame);
                assert!((tile.sprite.clock.accumulator() - carry).abs() < 0.000_01);
                assert_eq!(tile.sprite.offset.x, frame * 64);
            }
        }
    }

    #[test]
    fn units_are_ordered_by_y_with_id_breaking_ties() {
        let mut scenario = ocean_scenario("strait");
        scenario.units.push(skiff(0, 250.0, 30.0));
        scenario.units.push(skiff(1, 250.0, 10.0));
        scenario.units.push(skiff(2, 280.0, 30.0));
        let mut session = started_session(scenario);
        session.update_session(0.01);
        let order: Vec<UnitId> = session.scenario().units.iter().map(|unit| unit.id).collect();
        assert_eq!(order, vec![UnitId(1), UnitId(0), UnitId(2)]);
    }

    #[test]
    fn left_click_selects_and_then_orders_a_move() {
        let mut scenario = ocean_scenario("strait");
        scenario.units.push(skiff(0, 336.0, 16.0));
        let mut session = started_session(scenario);
        session.camera_mut().set_position(200.0, -10.0);
        assert_eq!(session.camera().position(), Vec2 { x: 200.0, y: -10.0 });

        // Unit center (320, 16) on screen is (120, 26).
        session.handle_mouse_event(MouseEvent {
            x: 120.0,
            y: 26.0,
            kind: MouseEventKind::LeftClick,
        });
        assert!(session.selected_unit().is_some());

        // Tile (0,0) center (256, 0) on screen is (56, 10).
        session.handle_mouse_event(MouseEvent {
            x: 56.0,
            y: 10.0,
            kind: MouseEventKind::LeftClick,
        });
        let unit = &session.scenario().units[0];
        assert_eq!(unit.destination(), Some(GridPos { row: 0, col: 0 }));
        assert_eq!(unit.target(), Some(Vec2 { x: 272.0, y: 0.0 }));
    }

    #[test]
    fn right_clicks_are_ignored() {
        let mut scenario = ocean_scenario("strait");
        scenario.units.push(skiff(0, 336.0, 16.0));
        let mut session = started_session(scenario);
        session.camera_mut().set_position(200.0, -10.0);
        session.handle_mouse_event(MouseEvent {
            x: 120.0,
            y: 26.0,
            kind: MouseEventKind::RightClick,
        });
        assert!(session.selected_unit().is_none());
    }

    #[test]
    fn camera_position_survives_a_scenario_swap() {
        let mut session = started_session(ocean_scenario("strait"));
        session.camera_mut().set_position(200.0, 0.0);
        session.load_scenario(ocean_scenario("island"));
        assert_eq!(session.scenario().name, "island");
        assert_eq!(session.camera().position(), Vec2 { x: 200.0, y: 0.0 });
        assert_eq!(
            session.camera().bounds(),
            WorldBounds {
                min_x: 192.0,
                min_y: -16.0,
                max_x: 320.0,
                max_y: 48.0,
            }
        );
    }

    #[test]
    fn moving_unit_walks_its_straight_line_across_ticks() {
        let mut scenario = ocean_scenario("strait");
        scenario.units.push(skiff(0, 336.0, 16.0));
        let mut session = started_session(scenario);
        session.camera_mut().set_position(200.0, -10.0);
        session.handle_mouse_event(MouseEvent {
            x: 120.0,
            y: 26.0,
            kind: MouseEventKind::LeftClick,
        });
        session.handle_mouse_event(MouseEvent {
            x: 56.0,
            y: 10.0,
            kind: MouseEventKind::LeftClick,
        });
        // Distance from (336, 16) to (272, 0) is about 65.97 px; at 40 px/s
        // and 25 ms ticks, 66 ticks are more than enough.
        for _ in 0..66 {
            session.update_session(0.025);
        }
        let unit = &session.scenario().units[0];
        assert_eq!(unit.sprite.position, Vec2 { x: 272.0, y: 0.0 });
        assert_eq!(unit.target(), None);
    }
}
