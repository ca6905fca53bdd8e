//! Integration tests for the module and world lifecycle.

mod common;

use std::sync::Arc;

use common::{
    harness, harness_configured, harness_with, BrokenHost, Callbacks, Delegates, Graph, HostLog,
};
use mantle_bridge::protocol::{
    Address, Argument, EventSlot, FunctionTables, ObjectKind, ObjectRef, TickPhase,
};
use mantle_bridge::{
    BridgeConfig, BridgeError, HostServices, Module, ModuleState, Status, TickGroup, WorldEvent,
    WorldHandle, WorldKind, WorldTickState,
};

const GAME: WorldHandle = WorldHandle::new(1, WorldKind::Game);
const EDITOR: WorldHandle = WorldHandle::new(2, WorldKind::Editor);

#[test]
fn test_startup_initializes_and_subscribes() {
    let mut h = harness();
    h.module.startup().unwrap();

    assert_eq!(h.module.state(), ModuleState::Started);
    assert_eq!(h.module.context().status(), Status::Idle);
    assert!(h.runtime.is_initialized());
    assert!(!h.runtime.is_loaded());

    let events: Vec<_> = h.host.subscriptions.lock().iter().map(|(_, e)| *e).collect();
    assert_eq!(events, vec![WorldEvent::PostInitialization, WorldEvent::Cleanup]);
    assert_eq!(h.module.tables().checksum(), 2);
}

#[test]
fn test_checksum_mismatch_fails_startup() {
    let mut h = harness_with(99, &EventSlot::ALL);
    let result = h.module.startup();

    assert!(matches!(result, Err(BridgeError::InitializationRejected { checksum: 2 })));
    assert_eq!(h.host.fatal_reports(), 1);
    assert_eq!(h.module.state(), ModuleState::Unloaded);
    assert!(!h.module.context().is_attached());
    assert_eq!(*h.host.stops.lock(), 1);
    assert!(h.host.subscriptions.lock().is_empty());
}

#[test]
fn test_hosting_failure_is_fatal() {
    let host = Arc::new(HostLog::default());
    let services = HostServices {
        runtime: Box::new(BrokenHost),
        ticks: Box::new(Graph(host.clone())),
        delegates: Box::new(Delegates::new(host.clone())),
        callbacks: Arc::new(Callbacks(host.clone())),
    };
    let mut module = Module::new(
        BridgeConfig::for_project("/opt/game"),
        services,
        FunctionTables::new(),
    );

    assert!(matches!(module.startup(), Err(BridgeError::Hosting(_))));
    assert_eq!(host.fatal_reports(), 1);
    assert_eq!(module.context().status(), Status::Stopped);
}

#[test]
fn test_startup_twice_is_rejected() {
    let mut h = harness();
    h.module.startup().unwrap();
    assert!(matches!(
        h.module.startup(),
        Err(BridgeError::InvalidTransition { operation: "startup", .. })
    ));
    assert_eq!(*h.host.starts.lock(), 1);
}

#[test]
fn test_post_initialization_registers_four_hooks() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();

    let groups: Vec<_> = h.host.registered.lock().iter().map(|(g, _)| *g).collect();
    assert_eq!(
        groups,
        vec![
            TickGroup::PrePhysics,
            TickGroup::DuringPhysics,
            TickGroup::EndPhysics,
            TickGroup::PostUpdateWork,
        ]
    );
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Registered);

    // Second notification for a live world is ignored.
    h.module.on_world_post_initialization(GAME).unwrap();
    assert_eq!(*h.host.registrations.lock(), 4);
}

#[test]
fn test_non_game_world_is_ignored() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(EDITOR).unwrap();
    h.module.on_world_begin_play(EDITOR).unwrap();

    assert_eq!(*h.host.registrations.lock(), 0);
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Stopped);
    assert_eq!(h.module.context().status(), Status::Idle);
}

#[test]
fn test_ticks_are_silent_until_begin_play() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();

    h.host.run_frame(0.016);
    assert!(h.host.events.lock().is_empty());
}

#[test]
fn test_begin_play_runs_world_events_in_order() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();
    h.module.on_world_begin_play(GAME).unwrap();

    assert_eq!(h.module.context().status(), Status::Running);
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Started);

    h.host.run_frame(0.5);
    h.host.run_frame(0.25);

    assert_eq!(
        h.host.events(),
        vec![
            EventSlot::OnWorldBegin,
            EventSlot::OnWorldPostBegin,
            EventSlot::OnWorldPrePhysicsTick,
            EventSlot::OnWorldDuringPhysicsTick,
            EventSlot::OnWorldPostPhysicsTick,
            EventSlot::OnWorldPostUpdateTick,
            EventSlot::OnWorldPrePhysicsTick,
            EventSlot::OnWorldDuringPhysicsTick,
            EventSlot::OnWorldPostPhysicsTick,
            EventSlot::OnWorldPostUpdateTick,
        ]
    );
    let events = h.host.events.lock();
    assert_eq!(events[2].1, Argument::Single(0.5));
    assert_eq!(events[6].1, Argument::Single(0.25));
}

#[test]
fn test_post_begin_fires_once_per_begin_play() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();

    for _ in 0..2 {
        h.module.on_world_begin_play(GAME).unwrap();
        h.host.run_frame(0.1);
        h.host.run_frame(0.1);
        h.module.on_world_end_play(GAME);
    }

    let post_begins = h
        .host
        .events()
        .into_iter()
        .filter(|slot| *slot == EventSlot::OnWorldPostBegin)
        .count();
    assert_eq!(post_begins, 2);
}

#[test]
fn test_post_begin_fires_with_post_update_only() {
    let mut config = BridgeConfig::for_project("/opt/game");
    config.tick_phases = vec![TickPhase::PostUpdate];
    let mut h = harness_configured(config, 2, &EventSlot::ALL);
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();
    h.module.on_world_begin_play(GAME).unwrap();

    h.host.run_frame(0.1);
    h.host.run_frame(0.1);

    assert_eq!(
        h.host.events(),
        vec![
            EventSlot::OnWorldBegin,
            EventSlot::OnWorldPostBegin,
            EventSlot::OnWorldPostUpdateTick,
            EventSlot::OnWorldPostUpdateTick,
        ]
    );
}

#[test]
fn test_post_initialization_after_begin_play_starts_ticks() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_begin_play(GAME).unwrap();
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Stopped);

    h.module.on_world_post_initialization(GAME).unwrap();
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Started);

    h.host.run_frame(0.1);
    assert_eq!(
        h.host.events(),
        vec![
            EventSlot::OnWorldBegin,
            EventSlot::OnWorldPostBegin,
            EventSlot::OnWorldPrePhysicsTick,
            EventSlot::OnWorldDuringPhysicsTick,
            EventSlot::OnWorldPostPhysicsTick,
            EventSlot::OnWorldPostUpdateTick,
        ]
    );

    h.module.on_world_end_play(GAME);
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Registered);
}

#[test]
fn test_end_play_unloads_and_stops_events() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();
    h.module.on_world_begin_play(GAME).unwrap();
    h.module.on_world_end_play(GAME);

    assert_eq!(h.module.context().status(), Status::Idle);
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Registered);
    assert!(!h.runtime.is_loaded());
    assert_eq!(h.module.context().event(EventSlot::OnWorldBegin), None);
    assert_eq!(h.host.events().last(), Some(&EventSlot::OnWorldEnd));

    let before = h.host.events.lock().len();
    h.host.run_frame(0.1);
    assert_eq!(h.host.events.lock().len(), before);
}

#[test]
fn test_missing_handlers_are_tolerated() {
    let mut h = harness_with(2, &[EventSlot::OnWorldPostUpdateTick]);
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();
    h.module.on_world_begin_play(GAME).unwrap();
    h.host.run_frame(0.1);

    assert_eq!(h.host.events(), vec![EventSlot::OnWorldPostUpdateTick]);
    assert!(h.host.reports().iter().all(|r| !r.starts_with("exception:")));
}

#[test]
fn test_required_find_reports_exception() {
    let mut h = harness_with(2, &[]);
    h.module.startup().unwrap();
    h.module.on_world_begin_play(GAME).unwrap();

    let context = h.module.context();
    assert_eq!(context.find("Gameplay.Spawn", true).unwrap(), None);
    assert!(h.host.reports().iter().all(|r| !r.starts_with("exception:")));

    assert_eq!(context.find("Gameplay.Spawn", false).unwrap(), None);
    assert_eq!(
        h.host.reports().last().map(String::as_str),
        Some("exception:method Gameplay.Spawn not found")
    );
}

#[test]
fn test_cleanup_stops_ticks_and_allows_reregistration() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();
    h.module.on_world_begin_play(GAME).unwrap();

    h.module.on_world_cleanup(GAME, true, true);
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Stopped);
    assert_eq!(h.module.context().status(), Status::Idle);
    assert_eq!(*h.host.unregistrations.lock(), 4);
    assert!(h.host.registered.lock().is_empty());
    assert_eq!(h.host.events().last(), Some(&EventSlot::OnWorldEnd));

    h.module.on_world_post_initialization(GAME).unwrap();
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Registered);
    assert_eq!(*h.host.registrations.lock(), 8);
}

#[test]
fn test_double_shutdown_is_idempotent() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();
    h.module.on_world_begin_play(GAME).unwrap();

    h.module.shutdown();
    h.module.shutdown();

    assert_eq!(h.module.state(), ModuleState::Unloaded);
    assert_eq!(h.module.context().status(), Status::Stopped);
    assert_eq!(h.module.context().world_tick_state(), WorldTickState::Stopped);
    assert_eq!(*h.host.unregistrations.lock(), 4);
    assert_eq!(*h.host.unsubscriptions.lock(), 2);
    assert_eq!(*h.host.stops.lock(), 1);
    assert!(!h.module.context().is_attached());

    // Cleanup arriving after shutdown changes nothing.
    h.module.on_world_cleanup(GAME, true, true);
    assert_eq!(*h.host.unregistrations.lock(), 4);
}

#[test]
fn test_restart_after_shutdown() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.shutdown();
    h.module.startup().unwrap();

    assert_eq!(h.module.state(), ModuleState::Started);
    assert!(h.runtime.is_initialized());
    assert_eq!(*h.host.starts.lock(), 2);
}

#[test]
fn test_begin_play_before_startup_is_rejected() {
    let mut h = harness();
    assert!(matches!(
        h.module.on_world_begin_play(GAME),
        Err(BridgeError::InvalidTransition { operation: "begin play", .. })
    ));
}

#[test]
fn test_delegate_dispatch_while_running() {
    let mut h = harness();
    h.module.startup().unwrap();

    let hit = ObjectRef::new(Address::new(0xBEEF0).unwrap(), ObjectKind::ActorHitDelegate);
    assert!(!h.module.dispatch_delegate(EventSlot::OnActorHit, hit).unwrap());

    h.module.on_world_begin_play(GAME).unwrap();
    assert!(h.module.dispatch_delegate(EventSlot::OnActorHit, hit).unwrap());

    let events = h.host.events.lock();
    let (slot, value) = events.last().copied().unwrap();
    assert_eq!(slot, EventSlot::OnActorHit);
    assert_eq!(value, Argument::Object(hit));
}

#[test]
fn test_delegate_kind_must_match_slot() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_begin_play(GAME).unwrap();

    let cursor = ObjectRef::new(Address::new(0x10).unwrap(), ObjectKind::ComponentCursorDelegate);
    assert!(matches!(
        h.module.dispatch_delegate(EventSlot::OnActorBeginOverlap, cursor),
        Err(BridgeError::DelegateMismatch { slot: EventSlot::OnActorBeginOverlap, .. })
    ));
    assert!(matches!(
        h.module.dispatch_delegate(EventSlot::OnWorldBegin, cursor),
        Err(BridgeError::DelegateMismatch { .. })
    ));
    assert!(h
        .module
        .dispatch_delegate(EventSlot::OnComponentEndCursorOver, cursor)
        .unwrap());
}

#[test]
fn test_managed_logs_reach_callbacks() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_begin_play(GAME).unwrap();
    h.module.on_world_end_play(GAME);

    let reports = h.host.reports();
    assert!(reports.contains(&"display:user assemblies loaded".to_owned()));
    assert!(reports.contains(&"display:user assemblies unloaded".to_owned()));
}

#[test]
fn test_ticks_from_worker_threads() {
    let mut h = harness();
    h.module.startup().unwrap();
    h.module.on_world_post_initialization(GAME).unwrap();
    h.module.on_world_begin_play(GAME).unwrap();

    let hooks: Vec<_> = h.host.registered.lock().iter().map(|(_, hook)| hook.clone()).collect();
    std::thread::scope(|scope| {
        for hook in &hooks {
            scope.spawn(move || {
                for _ in 0..100 {
                    hook.execute_tick(
                        0.01,
                        mantle_bridge::LevelTick::All,
                        mantle_bridge::NamedThread(1),
                        &mantle_bridge::CompletionEvent(0),
                    );
                }
            });
        }
    });

    let ticks = h
        .host
        .events()
        .into_iter()
        .filter(|slot| *slot != EventSlot::OnWorldBegin && *slot != EventSlot::OnWorldPostBegin)
        .count();
    assert_eq!(ticks, 400);
}
