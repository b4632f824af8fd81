//! Bevy integration layer.
//!
//! Registers the simulation core as ECS resources and systems so a headless
//! or rendering host can drive it from its own `App`. Physics and collision
//! detection stay with the host: systems here write velocities and apply
//! damage, never positions. The host reports what it detected through
//! `FireRequest` and `ProjectileImpact` events.
//!
//! Per-frame order: clock -> player target -> player fire -> enemy
//! steering/AI -> enemy attacks -> projectile impacts -> expired projectile
//! cleanup -> dead enemy cleanup -> session timers.

use bevy::math::Vec2;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::combat::{
    area_damage, knockback_velocity, Contact, DamageEvent, DamageKind, EntityId, Explosion, Health,
    Projectile,
};
use crate::config::SimConfig;
use crate::error::CoreResult;
use crate::generation::{Dungeon, DungeonGenerator};
use crate::monster::{AiBrain, Enemy};
use crate::player::Player;
use crate::session::SimulationSession;
use crate::steering::{agent_rng, Agent};

pub struct SimulationPlugin {
    config: SimConfig,
    session: SimulationSession,
}

impl SimulationPlugin {
    pub fn new(config: SimConfig) -> CoreResult<Self> {
        config.validate()?;
        let session = SimulationSession::new(config.session.clone(), config.seed)?;
        Ok(Self { config, session })
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // level 0 is never generated, so its hash is free for the run stream
        let rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed.level_hash(0));

        app.insert_resource(self.config.clone())
            .insert_resource(self.session.clone())
            .insert_resource(Generator(DungeonGenerator::new(
                self.config.generation.clone(),
            )))
            .insert_resource(SimRng(rng))
            .init_resource::<SimClock>()
            .init_resource::<PlayerTarget>()
            .add_event::<FireRequest>()
            .add_event::<ProjectileImpact>()
            .add_event::<EnemyAttackEvent>()
            .add_event::<DamageEvent>()
            .add_systems(
                Update,
                (
                    advance_clock,
                    track_player,
                    player_fire,
                    steer_enemies,
                    apply_enemy_attacks,
                    resolve_impacts,
                    reap_projectiles,
                    reap_dead_enemies,
                    session_timers,
                )
                    .chain(),
            );
    }
}

/// Level generator configured from `SimConfig`
#[derive(Resource, Debug, Clone)]
pub struct Generator(pub DungeonGenerator);

/// Run-wide random stream for weapon spread
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub Xoshiro256PlusPlus);

/// Monotonic simulation clock in milliseconds
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    pub now_ms: u64,
    pub tick: u64,
    carry_ms: f64,
}

impl SimClock {
    pub fn advance(&mut self, delta_secs: f64) {
        let total = self.carry_ms + delta_secs.max(0.0) * 1000.0;
        let whole = total.floor();
        self.now_ms += whole as u64;
        self.carry_ms = total - whole;
        self.tick += 1;
    }
}

/// Where enemies are heading. Filled from the `Player` entity when one
/// exists; hosts without one can set it directly.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerTarget(pub Option<Vec2>);

/// Host asks the player to fire the drawn weapon at a world position
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FireRequest {
    pub target: Vec2,
}

/// Collision reported by the host for a projectile entity
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum ProjectileImpact {
    Target {
        projectile: Entity,
        target: Entity,
        position: Vec2,
    },
    Wall {
        projectile: Entity,
        position: Vec2,
    },
}

/// An enemy landed a melee attack on the player
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyAttackEvent {
    pub attacker: EntityId,
    pub damage: f32,
    pub position: Vec2,
}

type EnemyQuery<'w, 's> =
    Query<'w, 's, (Entity, &'static Enemy, &'static mut Agent, &'static mut Health)>;

/// Generate the next level of the run and install it as the `Dungeon`
/// resource
pub fn load_next_level(world: &mut World) -> CoreResult<()> {
    let generator = world.resource::<Generator>().0.clone();
    let dungeon = world
        .resource_mut::<SimulationSession>()
        .next_level(&generator)?;
    world.insert_resource(dungeon);
    Ok(())
}

/// Spawn the opening wave for the current `Dungeon`. Returns how many
/// enemies were placed.
pub fn populate_level(world: &mut World) -> CoreResult<usize> {
    let ai = world.resource::<SimConfig>().ai.clone();
    let bundles = world.resource_scope(|world, mut session: Mut<SimulationSession>| {
        let dungeon = world.resource::<Dungeon>();
        session.spawn_initial_enemies(dungeon)
    })?;
    let count = bundles.len();
    world.spawn_batch(bundles.into_iter().map(move |mut bundle| {
        bundle.brain = AiBrain::new(ai.clone());
        bundle
    }));
    Ok(count)
}

/// Place the player at the current level's start position
pub fn spawn_player(world: &mut World) -> Entity {
    let start = world.resource::<Dungeon>().start_position;
    let window = world.resource::<SimConfig>().combat.player_invulnerable_ms;
    world.spawn(Player::new(start, window)).id()
}

fn advance_clock(time: Option<Res<Time>>, mut clock: ResMut<SimClock>) {
    let delta = time.map_or(0.0, |t| t.delta_secs_f64());
    clock.advance(delta);
}

fn track_player(players: Query<&Player>, mut target: ResMut<PlayerTarget>) {
    if let Ok(player) = players.get_single() {
        target.0 = player.is_alive().then_some(player.agent.position);
    }
}

fn player_fire(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut rng: ResMut<SimRng>,
    mut requests: EventReader<FireRequest>,
    mut players: Query<&mut Player>,
) {
    let Ok(mut player) = players.get_single_mut() else {
        requests.clear();
        return;
    };
    for request in requests.read() {
        if !player.is_alive() {
            break;
        }
        if let Some(shots) = player.fire(clock.now_ms, request.target, &mut rng.0) {
            commands.spawn_batch(shots);
        }
    }
}

fn steer_enemies(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    target: Res<PlayerTarget>,
    dungeon: Option<Res<Dungeon>>,
    mut enemies: Query<(Entity, &Enemy, &mut Agent, &mut AiBrain)>,
    mut attacks: EventWriter<EnemyAttackEvent>,
) {
    let (Some(dungeon), Some(target)) = (dungeon, target.0) else {
        return;
    };

    // neighbor snapshot taken before anyone moves
    let positions: Vec<Vec2> = enemies.iter().map(|(_, _, a, _)| a.position).collect();

    for (entity, enemy, mut agent, mut brain) in &mut enemies {
        let mut rng = agent_rng(config.seed.seed, clock.tick, entity.index() as usize);
        let out = brain.tick(
            clock.now_ms,
            &agent,
            target,
            &dungeon.grid,
            &positions,
            &config.steering,
            &mut rng,
        );
        agent.velocity = out.velocity;
        agent.facing = out.facing;
        if out.attacked {
            attacks.send(EnemyAttackEvent {
                attacker: entity.into(),
                damage: enemy.damage,
                position: agent.position,
            });
        }
    }
}

fn apply_enemy_attacks(
    clock: Res<SimClock>,
    mut attacks: EventReader<EnemyAttackEvent>,
    mut players: Query<(Entity, &mut Player)>,
    mut damage: EventWriter<DamageEvent>,
    mut session: ResMut<SimulationSession>,
) {
    let Ok((entity, mut player)) = players.get_single_mut() else {
        attacks.clear();
        return;
    };
    for attack in attacks.read() {
        let dealt = player.health.take_damage(attack.damage, clock.now_ms);
        if dealt > 0.0 {
            damage.send(DamageEvent {
                target: entity.into(),
                amount: dealt,
                kind: DamageKind::Melee,
                position: player.agent.position,
            });
        }
    }
    if !player.is_alive() {
        session.end_game();
    }
}

fn resolve_impacts(
    mut commands: Commands,
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    mut impacts: EventReader<ProjectileImpact>,
    mut projectiles: Query<&mut Projectile>,
    mut enemies: EnemyQuery,
    mut damage: EventWriter<DamageEvent>,
) {
    let knockback = config.combat.base_knockback;
    for impact in impacts.read() {
        match *impact {
            ProjectileImpact::Target {
                projectile,
                target,
                position,
            } => {
                let Ok(mut shot) = projectiles.get_mut(projectile) else {
                    continue;
                };
                match shot.contact(target.into(), position) {
                    Contact::Direct {
                        damage: amount,
                        consumed,
                    } => {
                        if let Ok((_, enemy, mut agent, mut health)) = enemies.get_mut(target) {
                            let dealt = health.take_damage(amount, clock.now_ms);
                            // zero when the enemy already died this frame
                            if dealt > 0.0 {
                                agent.velocity = knockback_velocity(
                                    agent.position,
                                    shot.origin(),
                                    enemy.knockback_resistance,
                                    knockback,
                                );
                                damage.send(DamageEvent {
                                    target: target.into(),
                                    amount: dealt,
                                    kind: DamageKind::Projectile,
                                    position,
                                });
                            }
                        }
                        if consumed {
                            commands.entity(projectile).despawn();
                        }
                    }
                    Contact::Explode(explosion) => {
                        explode(&explosion, clock.now_ms, knockback, &mut enemies, &mut damage);
                        commands.entity(projectile).despawn();
                    }
                    Contact::Spent | Contact::AlreadyPierced => {}
                }
            }
            ProjectileImpact::Wall {
                projectile,
                position,
            } => {
                let Ok(mut shot) = projectiles.get_mut(projectile) else {
                    continue;
                };
                if shot.is_spent() {
                    continue;
                }
                if let Some(explosion) = shot.hit_wall(position) {
                    explode(&explosion, clock.now_ms, knockback, &mut enemies, &mut damage);
                }
                commands.entity(projectile).despawn();
            }
        }
    }
}

fn explode(
    explosion: &Explosion,
    now_ms: u64,
    knockback: f32,
    enemies: &mut EnemyQuery,
    damage: &mut EventWriter<DamageEvent>,
) {
    let mut caught = 0;
    for (entity, enemy, mut agent, mut health) in enemies.iter_mut() {
        let distance = explosion.center.distance(agent.position);
        let Some(amount) = area_damage(explosion.damage, explosion.radius, distance) else {
            continue;
        };
        let dealt = health.take_damage(amount, now_ms);
        if dealt <= 0.0 {
            continue;
        }
        agent.velocity = knockback_velocity(
            agent.position,
            explosion.center,
            enemy.knockback_resistance,
            knockback,
        );
        damage.send(DamageEvent {
            target: entity.into(),
            amount: dealt,
            kind: DamageKind::Explosion,
            position: agent.position,
        });
        caught += 1;
    }
    debug!(radius = explosion.radius, caught, "explosion");
}

/// Despawn projectiles past their range or lifetime, or outside the level.
/// Positions follow the straight flight path from the muzzle.
fn reap_projectiles(
    mut commands: Commands,
    clock: Res<SimClock>,
    dungeon: Option<Res<Dungeon>>,
    projectiles: Query<(Entity, &Projectile)>,
) {
    let mut reaped = 0;
    for (entity, shot) in &projectiles {
        let position = shot.position_at(clock.now_ms);
        let escaped = dungeon
            .as_ref()
            .is_some_and(|d| shot.escaped(position, &d.grid));
        if escaped || shot.is_expired(position, clock.now_ms) {
            commands.entity(entity).despawn();
            reaped += 1;
        }
    }
    if reaped > 0 {
        trace!(reaped, "projectiles expired");
    }
}

fn reap_dead_enemies(
    mut commands: Commands,
    enemies: Query<(Entity, &Enemy, &Health)>,
    mut session: ResMut<SimulationSession>,
) {
    for (entity, enemy, health) in &enemies {
        if health.is_alive() {
            continue;
        }
        session.add_score(enemy.score);
        session.record_kill();
        commands.entity(entity).despawn();
    }
}

fn session_timers(
    mut commands: Commands,
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    dungeon: Option<Res<Dungeon>>,
    mut session: ResMut<SimulationSession>,
) {
    let due = session.tick(clock.now_ms);
    let Some(dungeon) = dungeon else {
        return;
    };
    for _ in 0..due.spawns {
        match session.spawn_enemy(&dungeon) {
            Ok(mut bundle) => {
                bundle.brain = AiBrain::new(config.ai.clone());
                commands.spawn(bundle);
            }
            Err(e) => warn!(error = %e, "periodic spawn skipped"),
        }
    }
}
