use bevy::prelude::*;

/// Abstraction layer between raw input and the player.
/// Keyboard (windowed) and scripted runs (headless) both write to this.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub shoot: bool,
    pub use_potion: bool,
}

impl PlayerInput {
    /// Maps a scripted action name onto the snapshot. Unknown names are
    /// reported back as `false`.
    pub fn press(&mut self, action: &str) -> bool {
        match action {
            "left" => self.left = true,
            "right" => self.right = true,
            "jump" => self.jump = true,
            "shoot" => self.shoot = true,
            "potion" | "use_potion" => self.use_potion = true,
            _ => return false,
        }
        true
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PlayerInput::default()).add_systems(
            PreUpdate,
            keyboard_to_input.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

/// Translate keyboard state to the player input snapshot
fn keyboard_to_input(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<PlayerInput>) {
    *input = PlayerInput {
        left: keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft),
        right: keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight),
        jump: keyboard.pressed(KeyCode::Space),
        shoot: keyboard.pressed(KeyCode::KeyF),
        use_potion: keyboard.pressed(KeyCode::KeyV),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn press_maps_known_actions() {
        let mut input = PlayerInput::default();
        assert!(input.press("left"));
        assert!(input.press("potion"));
        assert!(!input.press("dash"));
        assert!(input.left && input.use_potion);
        assert!(!input.right && !input.jump && !input.shoot);
    }

    #[test]
    fn keyboard_state_is_mirrored() {
        let mut world = World::new();
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::ArrowRight);
        keys.press(KeyCode::KeyF);
        world.insert_resource(keys);
        world.insert_resource(PlayerInput {
            left: true,
            ..default()
        });
        world
            .run_system_once(keyboard_to_input)
            .expect("keyboard mapping");
        let input = *world.resource::<PlayerInput>();
        assert!(input.right && input.shoot);
        assert!(!input.left && !input.jump && !input.use_potion);
    }
}
