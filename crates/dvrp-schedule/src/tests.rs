//! Unit tests for dvrp-schedule.

use std::sync::Arc;

use dvrp_core::{GeoPoint, NodeId, RequestId, SimTime, VehicleId};
use dvrp_spatial::{DijkstraRouter, RoadNetwork, RoadNetworkBuilder, Route, Router};

use crate::{
    DiversionPolicy, DrivePurpose, Schedule, ScheduleError, ScheduleStatus, StayPurpose, Task,
    TaskStatus, WakeQueue,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Five nodes on a line, 100 s and 1 km between neighbours.
fn line() -> RoadNetwork {
    RoadNetworkBuilder::grid(GeoPoint::new(0.0, 0.0), 1, 5, 0.01, 1_000.0, 100_000).build()
}

fn route(net: &RoadNetwork, from: u32, to: u32) -> Arc<Route> {
    Arc::new(DijkstraRouter::new().route(net, NodeId(from), NodeId(to), SimTime::ZERO).unwrap())
}

fn schedule() -> Schedule {
    Schedule::new(VehicleId(0), NodeId(0), SimTime(0), SimTime(10_000))
}

const BOTH: DiversionPolicy = DiversionPolicy { destination_known: true, diversion_allowed: true };

// ── Planning ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod planning {
    use super::*;

    #[test]
    fn unplanned_ends_at_start() {
        let s = schedule();
        assert_eq!(s.status(), ScheduleStatus::Unplanned);
        assert_eq!(s.end_time(), SimTime(0));
        assert_eq!(s.end_node(), NodeId(0));
        assert_eq!(s.current_task(SimTime(5)).unwrap(), None);
    }

    #[test]
    fn append_chain() {
        let net = line();
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 2), SimTime(0))).unwrap();
        s.append_task(Task::wait(NodeId(2), SimTime(200), SimTime(300))).unwrap();
        assert_eq!(s.status(), ScheduleStatus::Planned);
        assert_eq!(s.task_count(), 2);
        assert_eq!(s.end_time(), SimTime(300));
        assert_eq!(s.end_node(), NodeId(2));
        s.check_continuity().unwrap();
    }

    #[test]
    fn append_rejects_time_gap() {
        let mut s = schedule();
        let err = s.append_task(Task::wait(NodeId(0), SimTime(5), SimTime(10))).unwrap_err();
        assert!(matches!(err, ScheduleError::Continuity { index: 0, found_time: SimTime(5), .. }));
        assert_eq!(s.status(), ScheduleStatus::Unplanned);
    }

    #[test]
    fn append_rejects_wrong_node() {
        let net = line();
        let mut s = schedule();
        let err = s
            .append_task(Task::drive(DrivePurpose::Cruise, route(&net, 1, 2), SimTime(0)))
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Continuity { expected_node: NodeId(0), found_node: NodeId(1), .. }
        ));
    }

    #[test]
    fn current_task_by_time() {
        let net = line();
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 1), SimTime(0))).unwrap();
        s.append_task(Task::wait(NodeId(1), SimTime(100), SimTime(150))).unwrap();

        assert!(s.current_task(SimTime(0)).unwrap().unwrap().is_drive());
        assert!(s.current_task(SimTime(99)).unwrap().unwrap().is_drive());
        assert!(s.current_task(SimTime(100)).unwrap().unwrap().is_wait());
        assert!(matches!(
            s.current_task(SimTime(150)),
            Err(ScheduleError::Inconsistency { .. })
        ));
    }

    #[test]
    fn replace_tail_swaps_planned_tasks() {
        let net = line();
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 1), SimTime(0))).unwrap();
        s.append_task(Task::wait(NodeId(1), SimTime(100), SimTime(500))).unwrap();

        let removed = s
            .replace_tail(1, vec![Task::drive(DrivePurpose::Cruise, route(&net, 1, 3), SimTime(100))])
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert!(removed[0].is_wait());
        assert_eq!(s.end_node(), NodeId(3));
        assert_eq!(s.end_time(), SimTime(300));
    }

    #[test]
    fn replace_tail_validates_before_mutating() {
        let net = line();
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 1), SimTime(0))).unwrap();
        let err = s.replace_tail(1, vec![Task::wait(NodeId(4), SimTime(100), SimTime(200))]);
        assert!(err.is_err());
        assert_eq!(s.task_count(), 1);
    }

    #[test]
    fn replace_everything_returns_to_unplanned() {
        let mut s = schedule();
        s.append_task(Task::wait(NodeId(0), SimTime(0), SimTime(50))).unwrap();
        s.replace_tail(0, Vec::new()).unwrap();
        assert_eq!(s.status(), ScheduleStatus::Unplanned);
    }

    #[test]
    fn replace_tail_refuses_started_tasks() {
        let mut s = schedule();
        s.append_task(Task::wait(NodeId(0), SimTime(0), SimTime(50))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        let err = s.replace_tail(0, Vec::new()).unwrap_err();
        assert_eq!(err, ScheduleError::NotPlanned { vehicle: VehicleId(0), index: 0 });
    }

    #[test]
    fn task_index_of_request() {
        let net = line();
        let r = RequestId(9);
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 1), SimTime(0))).unwrap();
        s.append_task(Task::drive(DrivePurpose::ToPickup(r), route(&net, 1, 2), SimTime(100))).unwrap();
        s.append_task(Task::stay(StayPurpose::Pickup(r), NodeId(2), SimTime(200), SimTime(260))).unwrap();
        assert_eq!(s.task_index_of(r), Some(1));
        assert_eq!(s.task_index_of(RequestId(1)), None);
        assert_eq!(s.tasks()[2].request(), Some(r));
    }
}

// ── Execution pointer ─────────────────────────────────────────────────────────

#[cfg(test)]
mod execution {
    use super::*;

    #[test]
    fn start_and_end_advance_pointer() {
        let net = line();
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 1), SimTime(0))).unwrap();
        s.append_task(Task::wait(NodeId(1), SimTime(100), SimTime(10_000))).unwrap();

        let t = s.start_next_task(SimTime(0)).unwrap();
        assert_eq!(t.status(), TaskStatus::Started);
        assert_eq!(s.status(), ScheduleStatus::Started);
        assert_eq!(s.current_index(), Some(0));

        assert!(s.end_current_task(SimTime(50)).is_err());
        let done = s.end_current_task(SimTime(100)).unwrap();
        assert_eq!(done.status(), TaskStatus::Performed);
        assert_eq!(s.current_index(), None);
        assert!(s.next_task().unwrap().is_wait());

        s.start_next_task(SimTime(100)).unwrap();
        s.end_current_task(SimTime(10_000)).unwrap();
        assert_eq!(s.status(), ScheduleStatus::Completed);
        assert!(matches!(
            s.append_task(Task::wait(NodeId(1), SimTime(10_000), SimTime(10_001))),
            Err(ScheduleError::Completed(_))
        ));
    }

    #[test]
    fn early_finish_appends_wait_until_t1() {
        let net = line();
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 2), SimTime(0))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        s.end_current_task(SimTime(200)).unwrap();

        assert_eq!(s.task_count(), 2);
        let wait = s.last_task().unwrap();
        assert!(wait.is_wait());
        assert_eq!((wait.begin, wait.end), (SimTime(200), SimTime(10_000)));
        assert_eq!(s.status(), ScheduleStatus::Started);
        s.check_continuity().unwrap();
    }

    #[test]
    fn pickup_past_shift_end_stays_open() {
        let net = line();
        let mut s = Schedule::new(VehicleId(0), NodeId(0), SimTime(0), SimTime(30));
        s.append_task(Task::stay(StayPurpose::Pickup(RequestId(0)), NodeId(0), SimTime(0), SimTime(60))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        s.end_current_task(SimTime(60)).unwrap();

        assert_eq!(s.status(), ScheduleStatus::Started);
        assert_eq!(s.task_count(), 1);
        assert!(s.next_task().is_none());

        // The dropoff leg can still be written after the shift.
        let leg = Task::drive(DrivePurpose::ToDropoff(RequestId(0)), route(&net, 0, 1), SimTime(60));
        s.replace_tail(s.first_planned_index(), vec![leg]).unwrap();
        s.start_next_task(SimTime(60)).unwrap();
        s.end_current_task(SimTime(160)).unwrap();
        assert_eq!(s.status(), ScheduleStatus::Completed);
    }

    #[test]
    fn cannot_start_future_task() {
        let mut s = Schedule::new(VehicleId(0), NodeId(0), SimTime(100), SimTime(1_000));
        s.append_task(Task::wait(NodeId(0), SimTime(100), SimTime(200))).unwrap();
        assert!(s.start_next_task(SimTime(99)).is_err());
        assert!(s.start_next_task(SimTime(100)).is_ok());
        assert!(s.start_next_task(SimTime(100)).is_err());
    }

    #[test]
    fn truncate_current_wait() {
        let mut s = schedule();
        s.append_task(Task::wait(NodeId(0), SimTime(0), SimTime(10_000))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        s.truncate_current_wait(SimTime(420)).unwrap();
        assert_eq!(s.end_time(), SimTime(420));
        s.append_task(Task::wait(NodeId(0), SimTime(420), SimTime(500))).unwrap();
        assert!(s.truncate_current_wait(SimTime(430)).is_err());
    }

    #[test]
    fn reset_clears() {
        let mut s = schedule();
        s.append_task(Task::wait(NodeId(0), SimTime(0), SimTime(10))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        s.reset();
        assert_eq!(s.status(), ScheduleStatus::Unplanned);
        assert_eq!(s.task_count(), 0);
        assert_eq!(s.current_index(), None);
    }
}

// ── Diversion ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod diversion {
    use super::*;

    fn cruising() -> (RoadNetwork, Schedule) {
        let net = line();
        let mut s = schedule();
        s.append_task(Task::drive(DrivePurpose::Cruise, route(&net, 0, 3), SimTime(0))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        (net, s)
    }

    #[test]
    fn point_is_next_node_at_or_after_now() {
        let (_, s) = cruising();
        let p = s.diversion_point(SimTime(150), BOTH).unwrap();
        assert_eq!((p.node, p.time, p.path_index), (NodeId(2), SimTime(200), 2));
        let p = s.diversion_point(SimTime(100), BOTH).unwrap();
        assert_eq!((p.node, p.time), (NodeId(1), SimTime(100)));
    }

    #[test]
    fn requires_both_flags() {
        let (_, s) = cruising();
        for policy in [
            DiversionPolicy { destination_known: false, diversion_allowed: true },
            DiversionPolicy { destination_known: true, diversion_allowed: false },
        ] {
            assert!(matches!(
                s.diversion_point(SimTime(10), policy),
                Err(ScheduleError::DiversionNotAllowed { .. })
            ));
        }
    }

    #[test]
    fn requires_current_drive() {
        let mut s = schedule();
        s.append_task(Task::wait(NodeId(0), SimTime(0), SimTime(100))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        assert!(matches!(
            s.diversion_point(SimTime(10), BOTH),
            Err(ScheduleError::DiversionNotAllowed { .. })
        ));
    }

    #[test]
    fn divert_splits_current_drive() {
        let (net, mut s) = cruising();
        let removed = s
            .divert_current_task(
                route(&net, 2, 4),
                DrivePurpose::ToPickup(RequestId(1)),
                SimTime(150),
                BOTH,
            )
            .unwrap();
        assert!(removed.is_empty());
        assert_eq!(s.task_count(), 2);

        let head = &s.tasks()[0];
        assert_eq!(head.status(), TaskStatus::Started);
        assert_eq!(head.end, SimTime(200));
        assert_eq!(head.end_node(), NodeId(2));
        assert_eq!(head.path().unwrap().nodes.len(), 3);

        let tail = &s.tasks()[1];
        assert_eq!(tail.request(), Some(RequestId(1)));
        assert_eq!((tail.begin, tail.end), (SimTime(200), SimTime(400)));
        s.check_continuity().unwrap();
    }

    #[test]
    fn divert_from_wrong_node_is_rejected() {
        let (net, mut s) = cruising();
        let err = s
            .divert_current_task(route(&net, 1, 4), DrivePurpose::Cruise, SimTime(150), BOTH)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Continuity { .. }));
        assert_eq!(s.tasks()[0].end, SimTime(300));
    }

    #[test]
    fn divert_returns_removed_tail() {
        let (net, mut s) = cruising();
        s.append_task(Task::wait(NodeId(3), SimTime(300), SimTime(400))).unwrap();
        let removed = s
            .divert_current_task(route(&net, 1, 1), DrivePurpose::Cruise, SimTime(50), BOTH)
            .unwrap();
        assert_eq!(removed.len(), 1);
        // Trivial suffix: the drive just stops at node 1.
        assert_eq!(s.task_count(), 1);
        assert_eq!(s.end_node(), NodeId(1));
        assert_eq!(s.end_time(), SimTime(100));
    }
}

// ── Dump ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dump {
    use super::*;

    #[test]
    fn marks_current_task() {
        let mut s = schedule();
        s.append_task(Task::wait(NodeId(0), SimTime(0), SimTime(10))).unwrap();
        s.start_next_task(SimTime(0)).unwrap();
        let dump = s.dump();
        assert_eq!(dump.current, Some(0));
        assert_eq!(dump.tasks[0].label, "wait-stay");
        let text = dump.to_string();
        assert!(text.starts_with("VehicleId(0) Started"));
        assert!(text.contains("*  0 wait-stay"));
    }
}

// ── WakeQueue ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod wake_queue {
    use super::*;

    #[test]
    fn push_dedups_per_time() {
        let mut q = WakeQueue::new();
        assert!(q.push(SimTime(10), VehicleId(1)));
        assert!(!q.push(SimTime(10), VehicleId(1)));
        assert!(q.push(SimTime(20), VehicleId(1)));
        assert_eq!(q.len(), 2);
        assert_eq!(q.next_time(), Some(SimTime(10)));
    }

    #[test]
    fn drain_due_in_time_order() {
        let mut q = WakeQueue::new();
        q.push(SimTime(30), VehicleId(3));
        q.push(SimTime(10), VehicleId(2));
        q.push(SimTime(10), VehicleId(1));
        q.push(SimTime(20), VehicleId(2));
        q.push(SimTime(40), VehicleId(4));

        assert_eq!(q.drain_due(SimTime(30)), vec![VehicleId(2), VehicleId(1), VehicleId(3)]);
        assert_eq!(q.len(), 1);
        assert!(q.drain_due(SimTime(39)).is_empty());
        assert_eq!(q.drain_due(SimTime::MAX), vec![VehicleId(4)]);
        assert!(q.is_empty());
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    /// A step is either a drive to a node or a stay of some length.
    fn steps() -> impl Strategy<Value = Vec<(bool, u32, u64)>> {
        prop::collection::vec((any::<bool>(), 0u32..5, 0u64..300), 1..12)
    }

    fn build(net: &RoadNetwork, steps: &[(bool, u32, u64)]) -> Schedule {
        let mut s = schedule();
        for &(is_drive, node, secs) in steps {
            let (t, at) = (s.end_time(), s.end_node());
            let task = if is_drive {
                Task::drive(DrivePurpose::Cruise, route(net, at.0, node), t)
            } else {
                Task::wait(at, t, t + secs)
            };
            s.append_task(task).unwrap();
        }
        s
    }

    proptest! {
        #[test]
        fn continuity_holds(steps in steps()) {
            let net = line();
            let s = build(&net, &steps);
            prop_assert!(s.check_continuity().is_ok());
            for pair in s.tasks().windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].begin);
                prop_assert_eq!(pair[0].end_node(), pair[1].begin_node());
            }
        }

        #[test]
        fn at_most_one_task_per_time(steps in steps(), probe in 0u64..4_000) {
            let net = line();
            let s = build(&net, &steps);
            let t = SimTime(probe);
            let hits = s.tasks().iter().filter(|task| task.contains(t)).count();
            prop_assert!(hits <= 1);
            if t < s.end_time() {
                prop_assert_eq!(hits, 1);
                prop_assert!(s.current_task(t).unwrap().is_some());
            }
        }
    }
}
