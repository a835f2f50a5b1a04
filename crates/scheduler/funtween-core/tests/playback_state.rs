use funtween_core::{
    EventKind, LoopMode, Looping, ManagerId, Phase, PlaybackManager, Scheduler, SequenceExt,
    Timeline,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn spawn(sched: &mut Scheduler, duration_s: f32, looping: Looping) -> ManagerId {
    sched.spawn(Timeline::new(duration_s).managed_with(looping, Phase::Update))
}

fn time_of(sched: &Scheduler, id: ManagerId) -> f32 {
    sched.get(id).expect("manager exists").time_passed()
}

/// it should stop on the final edge and announce the end exactly once
#[test]
fn single_play_runs_to_completion() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 1.0, Looping::single());
    sched.manager(id).unwrap().play(true);

    let mut started = 0;
    let mut ended = 0;
    for _ in 0..4 {
        let out = sched.dispatch(Phase::Update, 0.4).unwrap();
        started += out.count(id, EventKind::Started);
        ended += out.count(id, EventKind::Ended);
    }
    assert_eq!(started, 1);
    assert_eq!(ended, 1);
    assert!(!sched.is_playing(id));
    assert_eq!(time_of(&sched, id), 1.0);
}

/// it should report the overshoot left over past the final edge
#[test]
fn single_play_reports_leftover() {
    let mut m: PlaybackManager = Timeline::new(1.0).managed(Phase::Update);
    assert!(!m.tick(0.4).unwrap().finished);
    assert!(!m.tick(0.4).unwrap().finished);
    let report = m.tick(0.4).unwrap();
    assert!(report.finished);
    approx(report.leftover, 0.2, 1e-5);
}

/// it should play backwards from the duration edge down to zero
#[test]
fn reversed_play_ends_at_zero() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 1.0, Looping::single());
    sched.manager(id).unwrap().play(false);
    assert_eq!(time_of(&sched, id), 1.0);

    let out = sched.dispatch(Phase::Update, 0.4).unwrap();
    let first = out.for_manager(id).next().copied().unwrap();
    assert_eq!(first.kind, EventKind::Started);
    assert!(!first.forwards);

    sched.dispatch(Phase::Update, 0.4).unwrap();
    let out = sched.dispatch(Phase::Update, 0.4).unwrap();
    assert_eq!(out.count(id, EventKind::Ended), 1);
    assert_eq!(time_of(&sched, id), 0.0);
    assert!(!sched.is_playing(id));
}

/// it should flip direction once per completed yoyo iteration
#[test]
fn yoyo_flips_once_per_iteration() {
    let mut m = Timeline::new(1.0).managed_with(Looping::forever_yoyo(), Phase::Update);
    for _ in 0..12 {
        m.tick(0.5).unwrap();
        assert_eq!(m.forwards, m.current_iteration % 2 == 0);
    }
    assert_eq!(m.current_iteration, 6);
}

/// it should restart from the starting edge and end after the last iteration
#[test]
fn restart_loops_a_fixed_number_of_times() {
    let mut m = Timeline::new(1.0).managed_with(Looping::times(3, LoopMode::Restart), Phase::Update);
    let mut started = 0;
    let mut ended = 0;
    for step in 0..6 {
        let report = m.tick(0.5).unwrap();
        started += report.count(EventKind::Started);
        ended += report.count(EventKind::Ended);
        if step == 1 {
            assert_eq!(m.time_passed(), 0.0);
            assert_eq!(m.current_iteration, 1);
        }
        assert_eq!(report.finished, step == 5);
    }
    assert_eq!(started, 3);
    assert_eq!(ended, 1);
    assert_eq!(m.time_passed(), 1.0);
}

/// it should restart from the duration edge when looping in reverse
#[test]
fn reversed_restart_returns_to_duration() {
    let mut m = Timeline::new(1.0).managed_with(Looping::times(2, LoopMode::Restart), Phase::Update);
    m.reverse().rewind();
    let report = m.tick(1.0).unwrap();
    assert_eq!(report.crossings, 1);
    assert_eq!(m.time_passed(), 1.0);
    assert!(!report.finished);
}

/// it should play from an arbitrary offset without firing a start
#[test]
fn play_from_offset() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 2.0, Looping::single());
    sched.manager(id).unwrap().play_from(1.5);
    assert_eq!(time_of(&sched, id), 1.5);
    assert!(sched.is_playing(id));

    let out = sched.dispatch(Phase::Update, 0.25).unwrap();
    assert!(out.for_manager(id).next().is_none());
    approx(time_of(&sched, id), 1.75, 1e-6);

    let out = sched.dispatch(Phase::Update, 0.5).unwrap();
    assert_eq!(out.count(id, EventKind::Ended), 1);
    assert_eq!(out.count(id, EventKind::Started), 0);
}

/// it should scale incoming deltas by the manager's timescale
#[test]
fn timescale_speeds_up_playback() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 2.0, Looping::single());
    sched.manager(id).unwrap().set_timescale(2.0).play(true);
    sched.dispatch(Phase::Update, 0.25).unwrap();
    assert_eq!(time_of(&sched, id), 0.5);
}

/// it should treat repeated stop and resume as no-ops and keep the position
#[test]
fn stop_and_resume_are_idempotent() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 2.0, Looping::single());
    sched.manager(id).unwrap().resume().resume();
    assert_eq!(sched.playing(Phase::Update), 1);

    sched.dispatch(Phase::Update, 0.25).unwrap();
    sched.manager(id).unwrap().stop().stop();
    assert_eq!(sched.playing(Phase::Update), 0);
    sched.dispatch(Phase::Update, 0.25).unwrap();
    assert_eq!(time_of(&sched, id), 0.25);

    let mut handle = sched.manager(id).unwrap();
    handle.resume();
    assert!(handle.is_playing());
    sched.dispatch(Phase::Update, 0.25).unwrap();
    assert_eq!(time_of(&sched, id), 0.5);
}

/// it should turn around mid-flight and finish on the zero edge
#[test]
fn reverse_while_playing() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 1.0, Looping::single());
    sched.manager(id).unwrap().play(true);
    sched.dispatch(Phase::Update, 0.5).unwrap();

    sched.manager(id).unwrap().reverse();
    let out = sched.dispatch(Phase::Update, 0.5).unwrap();
    let ended: Vec<_> = out.for_manager(id).collect();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].kind, EventKind::Ended);
    assert!(!ended[0].forwards);
}

/// it should pick up a looping policy changed while playing
#[test]
fn set_looping_while_playing() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 1.0, Looping::single());
    sched
        .manager(id)
        .unwrap()
        .play(true)
        .set_looping(Looping::forever(LoopMode::Restart));

    let out = sched.dispatch(Phase::Update, 2.5).unwrap();
    assert_eq!(out.count(id, EventKind::Ended), 0);
    assert!(sched.is_playing(id));
    approx(time_of(&sched, id), 0.5, 1e-6);
}

/// it should keep despawned managers out of every later pass
#[test]
fn despawn_returns_the_manager() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 1.0, Looping::single());
    sched.manager(id).unwrap().play(true);
    sched.dispatch(Phase::Update, 0.25).unwrap();

    let m = sched.despawn(id).unwrap();
    assert_eq!(m.time_passed(), 0.25);
    assert!(sched.is_empty());
    assert!(!sched.is_playing(id));
    assert!(sched.manager(id).is_none());
    assert!(sched.register(id).is_err());
}

#[test]
fn outputs_serialize_for_hosts() {
    let mut sched = Scheduler::default();
    let id = spawn(&mut sched, 1.0, Looping::single());
    sched.manager(id).unwrap().play(true);
    let out = sched.dispatch(Phase::Update, 0.1).unwrap();
    let json = serde_json::to_value(out).unwrap();
    assert_eq!(json["events"][0]["kind"], "Started");
    assert_eq!(json["events"][0]["forwards"], true);
}
