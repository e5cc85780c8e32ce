use cosim_core::{Observer, SimulationUnit};
use tracing::debug;

use crate::snapshot::{Snapshot, SnapshotStore};

use super::{Action, Bracket, Config, Error, Event, Solution, Status, bracket::signs};

/// Bisects `[left.time(), right]` for the first indicator sign change.
///
/// The unit only ever integrates forward from the current left end, which is
/// re-saved whenever the bracket moves right.
pub(super) fn bisect<U, Obs>(
    unit: &mut U,
    store: &SnapshotStore<U::State>,
    left: &Snapshot<U::State>,
    right: f64,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    U: SimulationUnit,
    Obs: Observer<Event, Action>,
{
    let mut bracket = Bracket::new(left.time(), right)?;
    let mut anchor = left.clone();

    store.restore(unit, &anchor)?;
    let left_signs = signs(&unit.event_indicators().map_err(Error::unit)?);

    let mut iters = 0;
    let status = loop {
        if bracket.width() < config.precision {
            break Status::Converged;
        }
        if iters >= config.max_iters {
            break Status::MaxIters;
        }

        let mid = bracket.midpoint();
        if mid <= bracket.left || mid >= bracket.right {
            return Err(Error::Stalled {
                left: bracket.left,
                right: bracket.right,
            });
        }

        unit.advance(mid).map_err(Error::unit)?;
        let crossed = signs(&unit.event_indicators().map_err(Error::unit)?) != left_signs;
        iters += 1;

        if crossed {
            bracket.right = mid;
            store.restore(unit, &anchor)?;
        } else {
            bracket.left = mid;
            anchor = store.save(unit);
        }

        let event = Event {
            iter: iters,
            time: mid,
            crossed,
            bracket,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            break Status::StoppedByObserver;
        }
    };

    unit.advance(bracket.right).map_err(Error::unit)?;
    debug!(
        left = bracket.left,
        right = bracket.right,
        iters,
        ?status,
        "bisection finished"
    );

    Ok(Solution {
        status,
        time: bracket.right,
        bracket,
        iters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use cosim_core::units::Zigzag;

    use crate::event::{localize, localize_unobserved};

    fn zigzag(k: f64) -> Zigzag {
        let mut unit = Zigzag::new();
        unit.set_real("k", k).expect("k is writable");
        unit.initialize(0.0).expect("should initialize");
        unit
    }

    #[test]
    fn locates_reflection_time() {
        let mut unit = zigzag(4.0);
        let store = SnapshotStore::new();
        unit.advance(0.2).expect("should advance");
        let left = store.save(&unit);

        let solution = localize_unobserved(&mut unit, &store, &left, 0.3, &Config::default())
            .expect("should localize");

        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.time, 0.25, epsilon = 1e-9);
        assert!(solution.bracket.width() < 1e-10);
        assert_relative_eq!(unit.time(), solution.time);
    }

    #[test]
    fn reports_max_iters() {
        let mut unit = zigzag(4.0);
        let store = SnapshotStore::new();
        let left = store.save(&unit);
        let config = Config {
            max_iters: 3,
            ..Config::default()
        };

        let solution =
            localize_unobserved(&mut unit, &store, &left, 1.0, &config).expect("should run");

        assert_eq!(solution.status, Status::MaxIters);
        assert_eq!(solution.iters, 3);
        assert_relative_eq!(solution.bracket.left, 0.125);
        assert_relative_eq!(solution.bracket.right, 0.25);
    }

    #[test]
    fn observer_can_stop_early() {
        let mut unit = zigzag(4.0);
        let store = SnapshotStore::new();
        let left = store.save(&unit);
        let mut seen = Vec::new();

        let solution = localize(
            &mut unit,
            &store,
            &left,
            1.0,
            &Config::default(),
            |event: &Event| {
                seen.push(event.crossed);
                (event.iter == 2).then_some(Action::StopEarly)
            },
        )
        .expect("should run");

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(seen, vec![true, true]);
        assert_relative_eq!(solution.time, 0.25);
    }
}
