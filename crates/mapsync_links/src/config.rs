//! Engine configuration.

/// The environment variable used to select the active game.
pub const GAME_ENV: &str = "MAPSYNC_GAME";

/// Game type whose `angles` keys carry the Quake1 pitch inversion.
pub const QUAKE1_GAME: &str = "q1";

/// Default snapping threshold for written Euler angles, in degrees.
pub const DEFAULT_ANGLE_SNAP_EPSILON: f32 = 1e-3;

/// Configuration for the linked-group engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedGroupsConfig {
    /// The active game type (e.g. `"q1"`, `"q3"`).
    pub game_type: String,
    /// Euler angles smaller than this (in degrees) are written as zero.
    pub angle_snap_epsilon: f32,
}

impl LinkedGroupsConfig {
    /// Create a config with defaults and no game type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            game_type: String::new(),
            angle_snap_epsilon: DEFAULT_ANGLE_SNAP_EPSILON,
        }
    }

    /// Create a config whose game type comes from the `MAPSYNC_GAME`
    /// environment variable (empty if unset).
    #[must_use]
    pub fn from_env() -> Self {
        let game_type = std::env::var(GAME_ENV).unwrap_or_default();
        Self::new().with_game_type(game_type)
    }

    /// Override the game type.
    #[must_use]
    pub fn with_game_type(mut self, game_type: impl Into<String>) -> Self {
        self.game_type = game_type.into();
        self
    }

    /// Override the angle snapping threshold.
    #[must_use]
    pub fn with_angle_snap_epsilon(mut self, epsilon: f32) -> Self {
        self.angle_snap_epsilon = epsilon;
        self
    }

    /// Returns `true` if the active game inverts the pitch stored in
    /// `angles` keys.
    #[must_use]
    pub fn quake1_angles_bug(&self) -> bool {
        self.game_type == QUAKE1_GAME
    }
}

impl Default for LinkedGroupsConfig {
    fn default() -> Self {
        Self::new()
    }
}
