/// Drives one session: pans and zooms the camera, forwards clicks to the
/// units, swaps the active scenario on request, and steps the simulation.
pub(crate) struct GameplayScene {
    defs_dir: Option<PathBuf>,
    unit_ids: UnitIdAllocator,
    active: ScenarioId,
}

impl GameplayScene {
    pub(crate) fn new(
        defs_dir: Option<PathBuf>,
        unit_ids: UnitIdAllocator,
        active: ScenarioId,
    ) -> Self {
        Self {
            defs_dir,
            unit_ids,
            active,
        }
    }
}

impl Scene for GameplayScene {
    fn load(&mut self, session: &mut GameSession) {
        session.start();
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, session: &mut GameSession) {
        let (window_width, window_height) = input.window_size();
        session
            .camera_mut()
            .set_viewport_size(window_width as f32, window_height as f32);

        let pan = pan_delta(input, fixed_dt_seconds);
        session.camera_mut().move_by(pan.x, pan.y);
        session
            .camera_mut()
            .apply_zoom_steps(input.zoom_delta_steps());

        if input.left_click_pressed() {
            if let Some(cursor) = input.cursor_position_px() {
                session.handle_mouse_event(MouseEvent {
                    x: cursor.x,
                    y: cursor.y,
                    kind: MouseEventKind::LeftClick,
                });
            }
        }

        if input.swap_scenario_pressed() {
            self.active = self.active.next();
            let scenario = load_or_builtin(
                self.defs_dir.as_deref(),
                self.active,
                session.surface_width(),
                &mut self.unit_ids,
            );
            session.load_scenario(scenario);
        }

        session.update_session(fixed_dt_seconds);
    }
}

/// Unit-length pan direction scaled by the tick delta. The camera applies
/// its own speed on top.
fn pan_delta(input: &InputSnapshot, fixed_dt_seconds: f32) -> Vec2 {
    let mut x = 0.0f32;
    let mut y = 0.0f32;

    if input.is_down(InputAction::PanRight) {
        x += 1.0;
    }
    if input.is_down(InputAction::PanLeft) {
        x -= 1.0;
    }
    if input.is_down(InputAction::PanUp) {
        y -= 1.0;
    }
    if input.is_down(InputAction::PanDown) {
        y += 1.0;
    }

    let len_sq = x * x + y * y;
    if len_sq > 0.0 {
        let inv_len = len_sq.sqrt().recip();
        x *= inv_len;
        y *= inv_len;
    }

    Vec2 {
        x: x * fixed_dt_seconds,
        y: y * fixed_dt_seconds,
    }
}
