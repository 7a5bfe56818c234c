use std::time::Duration;

use lawn_defence_core::{Command, Event, PlantKind, STARTING_SUN, SUN_VALUE};
use lawn_defence_system_sky_sun::{Config, SkySun};
use lawn_defence_world::{self as world, query, World};

const DT: Duration = Duration::from_millis(100);

#[test]
fn sky_suns_fall_settle_and_can_be_collected() {
    let mut world = World::new();
    let (lanes, columns) = query::lawn_size(&world);
    let mut sky = SkySun::new(Config::new(lanes, columns, 0xfeed));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::AddCard {
            kind: PlantKind::WallNut,
        },
        &mut events,
    );
    world::apply(&mut world, Command::StartRound, &mut events);
    pump(&mut world, &mut sky, events);

    let suns = query::suns(&world);
    assert_eq!(suns.len(), 1, "a sun drops as soon as the round starts");
    assert!(!suns[0].landed);

    for _ in 0..60 {
        tick(&mut world, &mut sky);
    }
    let suns = query::suns(&world);
    assert!(suns[0].landed);

    for _ in 0..40 {
        tick(&mut world, &mut sky);
    }
    assert_eq!(query::suns(&world).len(), 2);

    let mut events = Vec::new();
    world::apply(&mut world, Command::CollectSun { sun: suns[0].id }, &mut events);
    assert!(events.contains(&Event::SunCollected {
        sun: suns[0].id,
        value: SUN_VALUE,
    }));
    assert_eq!(query::sun_balance(&world), STARTING_SUN + SUN_VALUE);
}

#[test]
fn ending_the_round_clears_and_stops_drops() {
    let mut world = World::new();
    let mut sky = SkySun::new(Config::new(5, 9, 1));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::AddCard {
            kind: PlantKind::WallNut,
        },
        &mut events,
    );
    world::apply(&mut world, Command::StartRound, &mut events);
    world::apply(&mut world, Command::EndRound, &mut events);
    pump(&mut world, &mut sky, events);

    for _ in 0..200 {
        tick(&mut world, &mut sky);
    }
    assert!(query::suns(&world).is_empty());
    assert!(!sky.is_active());
}

fn tick(world: &mut World, sky: &mut SkySun) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: DT }, &mut events);
    pump(world, sky, events);
}

fn pump(world: &mut World, sky: &mut SkySun, mut events: Vec<Event>) {
    while !events.is_empty() {
        let mut commands = Vec::new();
        sky.handle(&events, &mut commands);
        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}
