//! End-to-end run tests
//!
//! Drives a whole run through the public API the way a host would:
//! level generation, spawning, shooting enemies down, module rewards,
//! explosive splash and game over.

use bevy::math::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use shooter_core::combat::{knockback_velocity, AreaCandidate, Contact, EntityId, Health};
use shooter_core::constants::{BASE_KNOCKBACK, PLAYER_INVULNERABLE_MS};
use shooter_core::generation::{DungeonGenerator, LevelSeed};
use shooter_core::monster::EnemyBundle;
use shooter_core::player::Player;
use shooter_core::session::{SessionConfig, SimulationSession};
use shooter_core::weapons::{Weapon, WeaponKind};

// ============================================================
// Helpers
// ============================================================

fn new_run(seed: u64) -> SimulationSession {
    SimulationSession::new(SessionConfig::default(), LevelSeed { seed }).unwrap()
}

/// Shoot at `enemy` with the drawn weapon until it dies. Every projectile is
/// assumed to connect. Returns the time of the killing blow.
fn shoot_down(player: &mut Player, enemy: &mut EnemyBundle, mut now: u64, rng: &mut Xoshiro256PlusPlus) -> u64 {
    let target = enemy.agent.position;
    while enemy.health.is_alive() {
        if let Some(shots) = player.fire(now, target, rng) {
            for mut shot in shots {
                if let Contact::Direct { damage, .. } = shot.contact(EntityId(1), target) {
                    enemy.health.take_damage(damage, now);
                }
            }
        }
        now += 50;
    }
    now
}

// ============================================================
// Runs
// ============================================================

#[test]
fn run_reaches_module_reward_and_upgrades_weapon() {
    let mut session = new_run(1234);
    let dungeon = session.next_level(&DungeonGenerator::default()).unwrap();
    let mut player = Player::new(dungeon.start_position, PLAYER_INVULNERABLE_MS);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);

    let interval = session.config().module_reward_interval;
    let mut now = 0;
    let mut offered = None;
    for _ in 0..interval {
        let mut enemy = session.spawn_enemy(&dungeon).unwrap();
        now = shoot_down(&mut player, &mut enemy, now, &mut rng);
        session.add_score(enemy.enemy.score);
        offered = session.record_kill().map(|offer| offer.to_vec());
    }

    assert_eq!(session.kill_count(), interval);
    assert!(session.score() > 0);
    let offer = offered.expect("reward due after a full interval of kills");
    assert_eq!(offer.len(), session.config().module_reward_choices);

    let before = player.current_weapon().effective().clone();
    let evicted = session
        .accept_reward(player.current_weapon_mut(), &offer[0].id)
        .unwrap();
    assert!(evicted.is_none(), "pistol had a free slot");
    assert!(!session.is_rewarding());
    assert_eq!(player.current_weapon().modifiers().len(), 1);
    assert_ne!(&before, player.current_weapon().effective(), "module changed nothing");
}

#[test]
fn kills_during_reward_choice_do_not_count() {
    let mut session = SimulationSession::new(
        SessionConfig {
            module_reward_interval: 2,
            ..Default::default()
        },
        LevelSeed::default(),
    )
    .unwrap();

    assert!(session.record_kill().is_none());
    assert!(session.record_kill().is_some());
    assert!(session.record_kill().is_none());
    assert_eq!(session.kill_count(), 2);

    session.dismiss_reward();
    session.record_kill();
    assert_eq!(session.kill_count(), 3);
}

#[test]
fn same_run_seed_replays_levels_and_spawns() {
    let generator = DungeonGenerator::default();
    let mut a = new_run(77);
    let mut b = new_run(77);

    for _ in 0..3 {
        let la = a.next_level(&generator).unwrap();
        let lb = b.next_level(&generator).unwrap();
        assert_eq!(la, lb);

        let sa: Vec<Vec2> = a
            .spawn_initial_enemies(&la)
            .unwrap()
            .iter()
            .map(|e| e.agent.position)
            .collect();
        let sb: Vec<Vec2> = b
            .spawn_initial_enemies(&lb)
            .unwrap()
            .iter()
            .map(|e| e.agent.position)
            .collect();
        assert_eq!(sa, sb);
    }

    let mut other = new_run(78);
    let first = new_run(77).next_level(&generator).unwrap();
    assert_ne!(other.next_level(&generator).unwrap().seed, first.seed);
}

#[test]
fn rocket_splash_damages_by_distance() {
    let mut rocket = Weapon::from_kind(WeaponKind::RocketLauncher);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    let mut shot = rocket
        .fire(0, Vec2::ZERO, 0.0, &mut rng)
        .and_then(|mut shots| shots.pop())
        .unwrap();

    let wall_hit = Vec2::new(200.0, 0.0);
    let explosion = shot.hit_wall(wall_hit).expect("rockets explode on walls");
    assert!(shot.is_spent());

    let candidates = [
        AreaCandidate { id: EntityId(1), position: wall_hit },
        AreaCandidate { id: EntityId(2), position: wall_hit + Vec2::new(50.0, 0.0) },
        AreaCandidate { id: EntityId(3), position: wall_hit + Vec2::new(0.0, 150.0) },
    ];
    let hits = explosion.resolve(&candidates);
    assert_eq!(hits, vec![(EntityId(1), 100.0), (EntityId(2), 75.0)]);

    let push = knockback_velocity(candidates[1].position, wall_hit, 0.5, BASE_KNOCKBACK);
    assert!(push.x > 0.0 && push.y.abs() < 1e-4, "pushed away from the blast");
}

#[test]
fn player_death_ends_the_run() {
    let mut session = new_run(5);
    let dungeon = session.next_level(&DungeonGenerator::default()).unwrap();
    let mut player = Player::new(dungeon.start_position, PLAYER_INVULNERABLE_MS);

    let mut now = 0;
    while player.is_alive() {
        player.health.take_damage(15.0, now);
        now += PLAYER_INVULNERABLE_MS;
    }
    session.end_game();

    assert!(session.is_game_over());
    assert!(session.record_kill().is_none());
    assert_eq!(session.tick(now + 60_000).spawns, 0);

    session.reset();
    assert!(!session.is_game_over());
    assert_eq!(session.level(), 0);
    let replay = session.next_level(&DungeonGenerator::default()).unwrap();
    assert_eq!(replay, dungeon, "reset replays the run from level 1");
}

#[test]
fn health_never_drops_below_zero() {
    let mut health = Health::new(30.0);
    assert_eq!(health.take_damage(50.0, 0), 30.0);
    assert_eq!(health.current, 0.0);
    assert!(!health.is_alive());
}
