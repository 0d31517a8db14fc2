//! Driver-mode arbiter: the client's reaction to who holds the driver seat.
//!
//! Only one connected client may drive at a time. The backend decides; the
//! arbiter turns each pushed `currentDriverId` into a local decision:
//!
//! | pushed id       | view      | decision                          |
//! |-----------------|-----------|-----------------------------------|
//! | my id           | any       | available                         |
//! | `-1` (nobody)   | driving   | unavailable + re-request the seat |
//! | `-1` (nobody)   | elsewhere | no change                         |
//! | someone else    | any       | unavailable                       |
//! | absent or `0`   | any       | no change                         |

use roverlink_protocol::{ClientId, NO_DRIVER};

/// Which screen the operator is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// The driving screen.
    Driving,
    /// Anything else.
    #[default]
    Elsewhere,
}

/// What to do with a pushed driver id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverDecision {
    /// We are the driver.
    Acquired,
    /// Someone else is driving.
    TakenBy(i64),
    /// The seat is empty and we are on the driving view: mark the seat
    /// unavailable and ask for it.
    Reacquire,
    /// Nothing to do.
    Unchanged,
}

/// Driver-mode state machine.
#[derive(Debug, Default)]
pub struct DriverArbiter {
    view: View,
    deferred_enters: usize,
}

impl DriverArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    /// Decides how to react to `currentDriverId`.
    pub fn decide(
        &self,
        me: ClientId,
        current_driver_id: Option<i64>,
    ) -> DriverDecision {
        match current_driver_id {
            None | Some(0) => DriverDecision::Unchanged,
            Some(id) if id == me.0 => DriverDecision::Acquired,
            Some(NO_DRIVER) => match self.view {
                View::Driving => DriverDecision::Reacquire,
                View::Elsewhere => DriverDecision::Unchanged,
            },
            Some(other) => DriverDecision::TakenBy(other),
        }
    }

    /// Remembers an `enterDriverMode` request made before the identity was
    /// known.
    pub fn defer_enter(&mut self) {
        self.deferred_enters += 1;
    }

    /// Takes every deferred request, leaving none behind.
    pub fn take_deferred_enters(&mut self) -> usize {
        std::mem::take(&mut self.deferred_enters)
    }

    pub fn deferred_enters(&self) -> usize {
        self.deferred_enters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: ClientId = ClientId(7);

    fn arbiter(view: View) -> DriverArbiter {
        let mut a = DriverArbiter::new();
        a.set_view(view);
        a
    }

    #[test]
    fn test_own_id_means_acquired() {
        let a = arbiter(View::Elsewhere);
        assert_eq!(a.decide(ME, Some(7)), DriverDecision::Acquired);
    }

    #[test]
    fn test_empty_seat_on_driving_view_reacquires() {
        let a = arbiter(View::Driving);
        assert_eq!(a.decide(ME, Some(NO_DRIVER)), DriverDecision::Reacquire);
    }

    #[test]
    fn test_empty_seat_elsewhere_is_ignored() {
        let a = arbiter(View::Elsewhere);
        assert_eq!(a.decide(ME, Some(NO_DRIVER)), DriverDecision::Unchanged);
    }

    #[test]
    fn test_other_driver_means_taken() {
        let a = arbiter(View::Driving);
        assert_eq!(a.decide(ME, Some(3)), DriverDecision::TakenBy(3));
    }

    #[test]
    fn test_absent_or_zero_driver_is_ignored() {
        let a = arbiter(View::Driving);
        assert_eq!(a.decide(ME, None), DriverDecision::Unchanged);
        assert_eq!(a.decide(ClientId::UNASSIGNED, Some(0)), DriverDecision::Unchanged);
    }

    #[test]
    fn test_deferred_enters_are_taken_once() {
        let mut a = DriverArbiter::new();
        a.defer_enter();
        a.defer_enter();
        assert_eq!(a.deferred_enters(), 2);
        assert_eq!(a.take_deferred_enters(), 2);
        assert_eq!(a.take_deferred_enters(), 0);
    }
}
