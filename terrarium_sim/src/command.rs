// Commands from outside the simulation.
//
// The ecosystem runs on its own; the only external input it accepts is a
// view-pan request from the (out-of-process) renderer. Commands still go
// through the same `SimCommand` envelope as everything else so that
// `SimState::step()` stays a function of `(state, commands)`.
//
// A `SimCommand` carries a `tick` (when to apply) and a `SimAction`.
// Current actions:
// - `PanView`: shift the view origin by whole tiles, wrapping.
//
// See also: `sim.rs` for `apply_command()` which dispatches these,
// `event.rs` for the `ViewPanned` event it emits.

use serde::{Deserialize, Serialize};

/// An action targeting a specific simulation tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimCommand {
    pub tick: u64,
    pub action: SimAction,
}

/// The specific action a command performs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimAction {
    /// Move the view origin by (dx, dy) tiles.
    PanView { dx: i32, dy: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serialization_roundtrip() {
        let cmd = SimCommand {
            tick: 42,
            action: SimAction::PanView { dx: -1, dy: 3 },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let restored: SimCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cmd);
    }
}
