use super::input::{ActionStates, InputAction};
use super::world::{GameSession, Vec2};

/// Per-tick view of the collected input. Edge flags (`*_pressed`) are true
/// for exactly one snapshot; held actions stay true while the key is down.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    swap_scenario_pressed: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    right_click_pressed: bool,
    zoom_delta_steps: i32,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quit_requested: bool,
        swap_scenario_pressed: bool,
        actions: ActionStates,
        cursor_position_px: Option<Vec2>,
        left_click_pressed: bool,
        right_click_pressed: bool,
        zoom_delta_steps: i32,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            swap_scenario_pressed,
            actions,
            cursor_position_px,
            left_click_pressed,
            right_click_pressed,
            zoom_delta_steps,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn swap_scenario_pressed(&self) -> bool {
        self.swap_scenario_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_click_pressed(&self) -> bool {
        self.right_click_pressed
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_swap_scenario_pressed(mut self, swap_scenario_pressed: bool) -> Self {
        self.swap_scenario_pressed = swap_scenario_pressed;
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_right_click_pressed(mut self, right_click_pressed: bool) -> Self {
        self.right_click_pressed = right_click_pressed;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}

/// Seam between the application loop and game logic. The loop owns one
/// session and one scene; the scene decides what each tick's input means
/// for that session.
pub trait Scene {
    fn load(&mut self, session: &mut GameSession);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, session: &mut GameSession);
    fn unload(&mut self, _session: &mut GameSession) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_are_tracked_independently() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::PanLeft, true)
            .with_action_down(InputAction::PanUp, true)
            .with_action_down(InputAction::PanUp, false);
        assert!(snapshot.is_down(InputAction::PanLeft));
        assert!(!snapshot.is_down(InputAction::PanUp));
        assert!(!snapshot.is_down(InputAction::Quit));
    }

    #[test]
    fn empty_snapshot_has_no_edges() {
        let snapshot = InputSnapshot::empty();
        assert!(!snapshot.left_click_pressed());
        assert!(!snapshot.swap_scenario_pressed());
        assert_eq!(snapshot.zoom_delta_steps(), 0);
        assert_eq!(snapshot.cursor_position_px(), None);
    }
}
