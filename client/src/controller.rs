use crate::network::NetworkController;
use pong_shared::{GameStateView, Movement};

/// A per-tick source of paddle movement.
///
/// The manager polls every controller once per tick through this trait and
/// never looks at the concrete type. `movement` must return immediately.
pub trait InputController {
    fn movement(&mut self, view: GameStateView<'_>) -> Movement;

    /// Releases whatever the controller holds. Safe to call more than once.
    fn destroy(&mut self) {}

    /// The network relay, for controllers that are one.
    fn as_network_mut(&mut self) -> Option<&mut NetworkController> {
        None
    }
}
