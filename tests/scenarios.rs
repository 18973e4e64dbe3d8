//! End-to-end scenario tests
//!
//! Each test builds a small flow directly through the domain types (no
//! JSON parsing involved) and drives it through `SimulateFlow` or
//! `OptimiseWorkers`, checking the scheduling behavior the scenario is
//! meant to pin down rather than just that the run completes.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Weekday};

use flowweaver::application::services::WaitReason;
use flowweaver::application::use_cases::optimise_workers::NullProgressSink;
use flowweaver::application::use_cases::{Demand, OptimiseWorkers, OptimiserRequest, SimulateFlow};
use flowweaver::domain::entities::task::{CycleRole, StartCondition, TaskKind};
use flowweaver::domain::entities::{Calendar, CycleBound, CycleGroup, Dependency, Flow, ReassignmentPolicy, ReassignmentTrigger, ResourcePool, TaskDefinition};
use flowweaver::domain::value_objects::{CycleGroupId, IterationIndex, Minutes, TaskId};

fn nine_to_five() -> Calendar {
    Calendar::weekdays_9_to_5(
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
    )
}

fn monday_9am() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 3).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

/// An 08:00-16:00 Mon-Fri calendar with no breaks, matching the literal
/// clock-time scenarios below exactly.
fn eight_to_four() -> Calendar {
    Calendar::weekdays_9_to_5(
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
    )
}

fn monday_8am() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 3).unwrap().and_hms_opt(8, 0, 0).unwrap()
}

fn monday_at(hour: u32, minute: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 3).unwrap().and_hms_opt(hour, minute, 0).unwrap()
}

fn tuesday_at(hour: u32, minute: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 4).unwrap().and_hms_opt(hour, minute, 0).unwrap()
}

fn unstaffed_task(id: u32, name: &str, minutes: u32, order: u32) -> TaskDefinition {
    TaskDefinition {
        id: TaskId(id),
        name: name.to_string(),
        duration: Minutes(minutes),
        kind: flowweaver::domain::entities::task::TaskKind::Ordinary,
        start_condition: flowweaver::domain::entities::task::StartCondition::AfterPredecessors,
        worker_pool: None,
        workers_required: 0,
        machine_pool: None,
        daily: false,
        cycle_role: CycleRole::None,
        cycle_group: None,
        is_feeder: false,
        group_key: None,
        group_position: None,
        declared_order: order,
    }
}

fn worker_task(id: u32, name: &str, minutes: u32, order: u32, pool: &str) -> TaskDefinition {
    TaskDefinition {
        worker_pool: Some(pool.to_string()),
        workers_required: 1,
        ..unstaffed_task(id, name, minutes, order)
    }
}

/// Linear three-task flow, one worker, no calendar gaps: A(30m) -> B(45m)
/// -> C(15m) on worker W1, Mon-Fri 08:00-16:00, starting Monday 08:00.
/// Pins the exact clock times and makespan.
#[test]
fn linear_three_task_flow_matches_exact_clock_times() {
    let flow = Flow {
        name: "linear".into(),
        tasks: vec![
            worker_task(0, "a", 30, 0, "w1"),
            worker_task(1, "b", 45, 1, "w1"),
            worker_task(2, "c", 15, 2, "w1"),
        ],
        dependencies: vec![
            Dependency::ordinary(TaskId(0), TaskId(1)),
            Dependency::ordinary(TaskId(1), TaskId(2)),
        ],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "w1".into(),
            capacity: 1,
        }],
        reassignment_policies: vec![],
        calendar: eight_to_four(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_8am()).unwrap();
    assert_eq!(result.makespan, Minutes(90));

    let entries = result.trace.entries();
    let a = entries.iter().find(|e| e.task_name == "a").unwrap();
    let b = entries.iter().find(|e| e.task_name == "b").unwrap();
    let c = entries.iter().find(|e| e.task_name == "c").unwrap();
    assert_eq!((a.start, a.end), (monday_at(8, 0), monday_at(8, 30)));
    assert_eq!((b.start, b.end), (monday_at(8, 30), monday_at(9, 15)));
    assert_eq!((c.start, c.end), (monday_at(9, 15), monday_at(9, 30)));
}

/// Two-worker parallel fan-out: root R(10m) fans to P(60m) and Q(60m);
/// W1 runs R then P, W2 runs Q; same calendar as above.
#[test]
fn parallel_fan_out_matches_exact_clock_times() {
    let flow = Flow {
        name: "fan-out".into(),
        tasks: vec![
            worker_task(0, "r", 10, 0, "w1"),
            worker_task(1, "p", 60, 1, "w1"),
            worker_task(2, "q", 60, 2, "w2"),
        ],
        dependencies: vec![
            Dependency::ordinary(TaskId(0), TaskId(1)),
            Dependency::ordinary(TaskId(0), TaskId(2)),
        ],
        cycle_groups: vec![],
        resource_pools: vec![
            ResourcePool {
                id: "w1".into(),
                capacity: 1,
            },
            ResourcePool {
                id: "w2".into(),
                capacity: 1,
            },
        ],
        reassignment_policies: vec![],
        calendar: eight_to_four(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_8am()).unwrap();
    assert_eq!(result.makespan, Minutes(70));

    let entries = result.trace.entries();
    let r = entries.iter().find(|e| e.task_name == "r").unwrap();
    let p = entries.iter().find(|e| e.task_name == "p").unwrap();
    let q = entries.iter().find(|e| e.task_name == "q").unwrap();
    assert_eq!((r.start, r.end), (monday_at(8, 0), monday_at(8, 10)));
    assert_eq!((p.start, p.end), (monday_at(8, 10), monday_at(9, 10)));
    assert_eq!((q.start, q.end), (monday_at(8, 10), monday_at(9, 10)));
}

/// Scenario: two tasks with no dependency between them, sharing a
/// one-worker pool, run one after the other rather than concurrently.
#[test]
fn two_tasks_serialize_on_a_single_worker_pool() {
    let mut task_a = unstaffed_task(0, "inspect-a", 60, 0);
    task_a.worker_pool = Some("line".into());
    task_a.workers_required = 1;
    let mut task_b = unstaffed_task(1, "inspect-b", 60, 1);
    task_b.worker_pool = Some("line".into());
    task_b.workers_required = 1;

    let flow = Flow {
        name: "fan-out".into(),
        tasks: vec![task_a, task_b],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "line".into(),
            capacity: 1,
        }],
        reassignment_policies: vec![],
        calendar: nine_to_five(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_9am()).unwrap();
    let entries = result.trace.entries();
    assert_eq!(entries.len(), 2);
    // The second task to reach the pool must wait for the first to free it.
    let (first, second) = if entries[0].start <= entries[1].start {
        (&entries[0], &entries[1])
    } else {
        (&entries[1], &entries[0])
    };
    assert!(second.start >= first.end);
}

/// Scenario: a two-worker pool lets both tasks run at the same time.
#[test]
fn two_worker_pool_runs_tasks_concurrently() {
    let mut task_a = unstaffed_task(0, "inspect-a", 60, 0);
    task_a.worker_pool = Some("line".into());
    task_a.workers_required = 1;
    let mut task_b = unstaffed_task(1, "inspect-b", 60, 1);
    task_b.worker_pool = Some("line".into());
    task_b.workers_required = 1;

    let flow = Flow {
        name: "parallel".into(),
        tasks: vec![task_a, task_b],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "line".into(),
            capacity: 2,
        }],
        reassignment_policies: vec![],
        calendar: nine_to_five(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_9am()).unwrap();
    let entries = result.trace.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].start, monday_9am());
    assert_eq!(entries[1].start, monday_9am());
    assert_eq!(result.makespan, Minutes(60));
}

/// Cycle group bounded at a fixed three iterations: Head H(10m) -> Body
/// B(20m) -> Tail T(10m), with a cyclic back-edge from the tail to the
/// head; a single worker W1 runs every task in the group. Pins every
/// iteration's exact start/end and the overall makespan.
#[test]
fn fixed_bound_cycle_matches_exact_clock_times() {
    let flow = Flow {
        name: "rework".into(),
        tasks: vec![
            TaskDefinition {
                cycle_role: CycleRole::Head,
                cycle_group: Some(CycleGroupId::from("qc")),
                ..worker_task(0, "head", 10, 0, "w1")
            },
            TaskDefinition {
                cycle_role: CycleRole::Body,
                cycle_group: Some(CycleGroupId::from("qc")),
                ..worker_task(1, "body", 20, 1, "w1")
            },
            TaskDefinition {
                cycle_role: CycleRole::Tail,
                cycle_group: Some(CycleGroupId::from("qc")),
                ..worker_task(2, "tail", 10, 2, "w1")
            },
        ],
        dependencies: vec![
            Dependency::ordinary(TaskId(0), TaskId(1)),
            Dependency::ordinary(TaskId(1), TaskId(2)),
            Dependency::cyclic(TaskId(2), TaskId(0)),
        ],
        cycle_groups: vec![CycleGroup {
            id: CycleGroupId::from("qc"),
            head: TaskId(0),
            tail: TaskId(2),
            bound: CycleBound::Fixed(3),
        }],
        resource_pools: vec![ResourcePool {
            id: "w1".into(),
            capacity: 1,
        }],
        reassignment_policies: vec![],
        calendar: eight_to_four(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_8am()).unwrap();
    assert_eq!(result.makespan, Minutes(120));

    let by_iteration = |name: &str, iteration: u32| {
        result
            .trace
            .entries()
            .iter()
            .find(|e| e.task_name == name && e.iteration == IterationIndex(iteration))
            .unwrap_or_else(|| panic!("no entry for {name} iteration {iteration}"))
    };

    let expected = [
        ("head", 1, (8, 0), (8, 10)),
        ("body", 1, (8, 10), (8, 30)),
        ("tail", 1, (8, 30), (8, 40)),
        ("head", 2, (8, 40), (8, 50)),
        ("body", 2, (8, 50), (9, 10)),
        ("tail", 2, (9, 10), (9, 20)),
        ("head", 3, (9, 20), (9, 30)),
        ("body", 3, (9, 30), (9, 50)),
        ("tail", 3, (9, 50), (10, 0)),
    ];
    for (name, iteration, (sh, sm), (eh, em)) in expected {
        let entry = by_iteration(name, iteration);
        assert_eq!(entry.start, monday_at(sh, sm), "{name} iteration {iteration} start");
        assert_eq!(entry.end, monday_at(eh, em), "{name} iteration {iteration} end");
    }
}

/// Shift boundary crossing: a single task X(600m) on worker W1, calendar
/// Mon-Fri 08:00-16:00 (8h/day), starting Monday 08:00. 480 minutes fit
/// in Monday's shift, the remaining 120 spill into Tuesday's, so X ends
/// Tuesday 10:00; the trace records the spill as a calendar wait.
#[test]
fn shift_boundary_crossing_matches_exact_clock_times_and_reason() {
    let flow = Flow {
        name: "overnight".into(),
        tasks: vec![worker_task(0, "long-bake", 600, 0, "w1")],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "w1".into(),
            capacity: 1,
        }],
        reassignment_policies: vec![],
        calendar: eight_to_four(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_8am()).unwrap();
    let entry = &result.trace.entries()[0];
    assert_eq!(entry.start, monday_8am());
    assert_eq!(entry.end, tuesday_at(10, 0));
    assert_eq!(entry.reason, WaitReason::WaitedOnCalendar);
}

/// Reassignment on-complete: A(30m, W1) and B(30m, initially no worker);
/// a reassignment rule moves W1 from A to B the instant A completes.
/// A runs 08:00-08:30, then W1 lands on B's pool at 08:30 and B runs
/// 08:30-09:00 with no gap.
#[test]
fn reassignment_on_complete_matches_exact_clock_times() {
    let flow = Flow {
        name: "handoff".into(),
        tasks: vec![worker_task(0, "a", 30, 0, "w1"), worker_task(1, "b", 30, 1, "w1-on-b")],
        dependencies: vec![Dependency::ordinary(TaskId(0), TaskId(1))],
        cycle_groups: vec![],
        resource_pools: vec![
            ResourcePool {
                id: "w1".into(),
                capacity: 1,
            },
            ResourcePool {
                id: "w1-on-b".into(),
                capacity: 0,
            },
        ],
        reassignment_policies: vec![ReassignmentPolicy {
            id: "move-w1-to-b".into(),
            trigger: ReassignmentTrigger::OnComplete(TaskId(0)),
            from_pool: "w1".into(),
            to_pool: "w1-on-b".into(),
            units: 1,
            only_if_target_not_staffed: false,
        }],
        calendar: eight_to_four(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_8am()).unwrap();
    let entries = result.trace.entries();
    let a = entries.iter().find(|e| e.task_name == "a").unwrap();
    let b = entries.iter().find(|e| e.task_name == "b").unwrap();
    assert_eq!((a.start, a.end), (monday_at(8, 0), monday_at(8, 30)));
    assert_eq!((b.start, b.end), (monday_at(8, 30), monday_at(9, 0)));
    assert_eq!(b.start, a.end);
}

/// Optimiser minimum-staffing search: three independent 60m tasks share
/// one "workers" pool, searched over capacities 1..=3 against a 90m
/// deadline. The ceiling trial at capacity 3 already meets the deadline
/// (makespan 60), so the binary search only has to rule out capacity 2
/// (makespan 120, too slow) before converging back on 3: two candidate
/// evaluations in total.
#[test]
fn optimiser_minimum_staffing_search_matches_exact_trial_count() {
    let flow = Flow {
        name: "fan-out-staffing".into(),
        tasks: vec![
            worker_task(0, "one", 60, 0, "workers"),
            worker_task(1, "two", 60, 1, "workers"),
            worker_task(2, "three", 60, 2, "workers"),
        ],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "workers".into(),
            capacity: 3,
        }],
        reassignment_policies: vec![],
        calendar: eight_to_four(),
    };

    let request = OptimiserRequest {
        pools: vec!["workers".into()],
        min_capacity: 1,
        max_capacity: 3,
        deadline: Minutes(90),
    };
    let mut sink = NullProgressSink;
    let result = OptimiseWorkers::optimise(&flow, &Demand::Units(1), monday_8am(), &request, &mut sink, &|| false).unwrap();

    assert_eq!(result.capacities["workers"], 3);
    assert_eq!(result.makespan, Minutes(60));
    assert_eq!(result.trials, 2);
}

/// Scenario: the optimiser finds the minimum worker count on a pool that
/// still meets a given deadline.
#[test]
fn optimiser_finds_the_minimum_staffing_for_a_deadline() {
    let mut task = unstaffed_task(0, "assemble", 60, 0);
    task.worker_pool = Some("line".into());
    task.workers_required = 1;

    let flow = Flow {
        name: "staffing".into(),
        tasks: vec![task],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "line".into(),
            capacity: 1,
        }],
        reassignment_policies: vec![],
        calendar: nine_to_five(),
    };

    // Four units of 60 minutes each need 2 workers to finish within 2 hours.
    let request = OptimiserRequest {
        pools: vec!["line".into()],
        min_capacity: 1,
        max_capacity: 4,
        deadline: Minutes(120),
    };
    let mut sink = NullProgressSink;
    let result = OptimiseWorkers::optimise(&flow, &Demand::Units(4), monday_9am(), &request, &mut sink, &|| false).unwrap();

    assert!(result.makespan.value() <= 120);
    assert_eq!(result.capacities["line"], 2);
}

/// Scenario: a mechanical-process task occupies only its machine pool;
/// two such tasks on a one-slot machine pool serialize even though
/// neither declares a worker.
#[test]
fn mechanical_process_task_occupies_only_its_machine_pool() {
    let mut press_a = unstaffed_task(0, "press-a", 40, 0);
    press_a.kind = TaskKind::MechanicalProcess;
    press_a.machine_pool = Some("press".into());
    let mut press_b = unstaffed_task(1, "press-b", 40, 1);
    press_b.kind = TaskKind::MechanicalProcess;
    press_b.machine_pool = Some("press".into());

    let flow = Flow {
        name: "press-shop".into(),
        tasks: vec![press_a, press_b],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "press".into(),
            capacity: 1,
        }],
        reassignment_policies: vec![],
        calendar: nine_to_five(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_9am()).unwrap();
    let entries = result.trace.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.worker_pool.is_none()));
    let (first, second) = if entries[0].start <= entries[1].start {
        (&entries[0], &entries[1])
    } else {
        (&entries[1], &entries[0])
    };
    assert!(second.start >= first.end);
}

/// Scenario: a daily preparation step runs once for its worker pool and
/// is skipped (zero duration, reason `daily-prep-skipped`) the second
/// time it is reached on the same calendar day.
#[test]
fn daily_preparation_step_runs_once_per_pool_per_day() {
    let mut prep_a = unstaffed_task(0, "line-warmup-a", 15, 0);
    prep_a.kind = TaskKind::Preparation;
    prep_a.daily = true;
    prep_a.worker_pool = Some("line".into());
    prep_a.workers_required = 1;

    let mut prep_b = unstaffed_task(1, "line-warmup-b", 15, 1);
    prep_b.kind = TaskKind::Preparation;
    prep_b.daily = true;
    prep_b.worker_pool = Some("line".into());
    prep_b.workers_required = 1;

    let flow = Flow {
        name: "warmup".into(),
        tasks: vec![prep_a, prep_b],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![ResourcePool {
            id: "line".into(),
            capacity: 1,
        }],
        reassignment_policies: vec![],
        calendar: nine_to_five(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_9am()).unwrap();
    let entries = result.trace.entries();
    assert_eq!(entries.len(), 2);
    let skipped = entries.iter().find(|e| e.reason == WaitReason::DailyPrepSkipped).unwrap();
    assert_eq!(skipped.start, skipped.end);
}

/// Scenario: a manual-trigger task with a declared (but non-gating)
/// predecessor starts at the run's opening instant rather than waiting
/// for that predecessor to complete.
#[test]
fn manual_trigger_task_starts_without_waiting_on_its_predecessor() {
    let slow_predecessor = unstaffed_task(0, "slow-setup", 120, 0);
    let mut triggered = unstaffed_task(1, "manual-step", 10, 1);
    triggered.start_condition = StartCondition::ManualTrigger;

    let flow = Flow {
        name: "manual".into(),
        tasks: vec![slow_predecessor, triggered],
        dependencies: vec![Dependency::ordinary(TaskId(0), TaskId(1))],
        cycle_groups: vec![],
        resource_pools: vec![],
        reassignment_policies: vec![],
        calendar: nine_to_five(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(1), monday_9am()).unwrap();
    let triggered_entry = result.trace.entries().iter().find(|e| e.task_name == "manual-step").unwrap();
    assert_eq!(triggered_entry.start, monday_9am());
}

/// Boundary case: zero demand units produces an empty trace and a zero
/// makespan rather than an error.
#[test]
fn zero_demand_units_yields_an_empty_trace_and_zero_makespan() {
    let flow = Flow {
        name: "empty-demand".into(),
        tasks: vec![unstaffed_task(0, "solo", 10, 0)],
        dependencies: vec![],
        cycle_groups: vec![],
        resource_pools: vec![],
        reassignment_policies: vec![],
        calendar: nine_to_five(),
    };

    let result = SimulateFlow::run(&flow, &Demand::Units(0), monday_9am()).unwrap();
    assert_eq!(result.makespan, Minutes(0));
    assert!(result.trace.entries().is_empty());
}

#[test]
fn weekday_set_can_exclude_friday() {
    let mut weekdays: BTreeSet<Weekday> = BTreeSet::new();
    weekdays.insert(Weekday::Mon);
    weekdays.insert(Weekday::Tue);
    let calendar = Calendar::new(
        weekdays,
        vec![flowweaver::domain::entities::ShiftWindow {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }],
        vec![],
        BTreeSet::new(),
    )
    .unwrap();
    assert!(!calendar.is_working_instant(
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap().and_hms_opt(10, 0, 0).unwrap()
    ));
}
