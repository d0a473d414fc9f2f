//! The turn driver.
//!
//! [`TurnLoop`] owns the map, the move providers, and the transcript, and
//! advances the game one turn at a time through a fixed pipeline:
//!
//! 1. Open the turn's transcript buckets.
//! 2. Retrieve moves from every living player in parallel, join all workers,
//!    then consume the results in player order. A timeout (or a provider
//!    panic) kills the player on the spot.
//! 3. Docking tick: advance `Docking`/`Undocking` transitions, regenerate
//!    docked ships, then unfreeze every planet (in place -- the unfreeze is
//!    real).
//! 4. For each micro-step: apply moves, detect events, resolve events,
//!    advance positions.
//! 5. Production and spawning, drag, weapon cooldowns.
//! 6. Snapshot the map into the transcript.
//! 7. Termination check, including the full-control victory rule.
//!
//! Iteration is always ascending (player id, ship index, planet index), so
//! the only tie-breaking anywhere -- the spawn-site scan -- is reproducible.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use parsec_replay::event::GameEvent;
use parsec_replay::stats::{GameStatistics, PlayerStatistics};
use parsec_replay::transcript::{ReplayHeader, Transcript};
use parsec_world::config::GameConstants;
use parsec_world::entity::{DockingStatus, EntityId, PlayerId};
use parsec_world::geom::Location;
use parsec_world::map::GameMap;
use parsec_world::moves::Move;

use crate::detect;
use crate::moves::{self, MoveProvider, MoveQueue};
use crate::resolve::Resolver;
use crate::EngineError;

/// Replay document format version emitted by this engine.
pub const REPLAY_VERSION: u32 = 31;

// ---------------------------------------------------------------------------
// GameOutcome
// ---------------------------------------------------------------------------

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    /// The sole survivor, if the game produced one. `None` for a
    /// single-player game, a turn-limit draw, or total mutual destruction.
    pub winner: Option<PlayerId>,
    /// Turns played.
    pub turns: u64,
}

// ---------------------------------------------------------------------------
// TurnLoop
// ---------------------------------------------------------------------------

/// The deterministic turn driver.
pub struct TurnLoop {
    map: GameMap,
    constants: GameConstants,
    providers: Vec<Box<dyn MoveProvider>>,
    transcript: Transcript,
    turn: u64,
    max_turns: u64,
    initialized: bool,
    damage_dealt: Vec<u64>,
    total_ship_count: Vec<u64>,
    last_frame_alive: Vec<u64>,
    init_response_ms: Vec<Option<u64>>,
    frame_response_ms: Vec<Vec<u64>>,
    timeout_tags: BTreeSet<PlayerId>,
}

impl TurnLoop {
    /// Assemble a game over `map` with one provider per player.
    ///
    /// `seed` is recorded in the replay header; the engine itself never
    /// consumes randomness.
    pub fn new(
        map: GameMap,
        constants: GameConstants,
        player_names: Vec<String>,
        providers: Vec<Box<dyn MoveProvider>>,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let num_players = map.num_players();
        if providers.len() != num_players {
            return Err(EngineError::ProviderCountMismatch {
                map_players: num_players,
                providers: providers.len(),
            });
        }
        if player_names.len() != num_players {
            return Err(EngineError::NameCountMismatch {
                map_players: num_players,
                names: player_names.len(),
            });
        }

        let header = ReplayHeader {
            version: REPLAY_VERSION,
            seed,
            map_generator: "external".to_owned(),
            width: map.width(),
            height: map.height(),
            player_names,
            constants: constants.clone(),
            planets_initial: map.each_planet().map(|(_, p)| p.clone()).collect(),
            poi: serde_json::json!([]),
        };
        let transcript = Transcript::new(header, map.clone());

        let max_turns = 100 + (map.width() * map.height()).sqrt() as u64;
        let total_ship_count = (0..num_players)
            .map(|p| map.player_ships(p).len() as u64)
            .collect();

        Ok(Self {
            map,
            constants,
            providers,
            transcript,
            turn: 0,
            max_turns,
            initialized: false,
            damage_dealt: vec![0; num_players],
            total_ship_count,
            last_frame_alive: vec![0; num_players],
            init_response_ms: vec![None; num_players],
            frame_response_ms: vec![Vec::new(); num_players],
            timeout_tags: BTreeSet::new(),
        })
    }

    // -- accessors -----------------------------------------------------------

    /// Read-only access to the world.
    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// Mutable access to the world. Use sparingly -- appropriate for initial
    /// setup and testing, not mid-game surgery.
    pub fn map_mut(&mut self) -> &mut GameMap {
        &mut self.map
    }

    /// The constants this game runs with.
    pub fn constants(&self) -> &GameConstants {
        &self.constants
    }

    /// Turns completed so far.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// The turn-limit ceiling, `100 + floor(sqrt(W * H))`.
    pub fn max_turns(&self) -> u64 {
        self.max_turns
    }

    /// The transcript recorded so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consume the driver, keeping the transcript.
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Players tagged for timing out.
    pub fn timeout_tags(&self) -> &BTreeSet<PlayerId> {
        &self.timeout_tags
    }

    // -- lifecycle -----------------------------------------------------------

    /// Run the pre-game initialization fan-out. A player that times out (or
    /// whose provider panics) is killed before turn 1.
    pub fn initialize(&mut self) {
        let living: Vec<bool> = (0..self.map.num_players())
            .map(|p| self.map.has_ships(p))
            .collect();
        let results = moves::initialize_all(&mut self.providers, &living, &self.map);
        for (player, result) in results.into_iter().enumerate() {
            if !living[player] {
                continue;
            }
            match result.flatten() {
                Some(ms) => self.init_response_ms[player] = Some(ms),
                None => {
                    warn!(player, "player timed out during initialization");
                    self.timeout_tags.insert(player);
                    self.kill_player(player);
                }
            }
        }
        self.initialized = true;
    }

    /// Advance the game by one turn and return per-player liveness after the
    /// termination check (full-control victories kill the losers here).
    pub fn process_turn(&mut self) -> Vec<bool> {
        let num_players = self.map.num_players();
        self.turn += 1;
        debug!(turn = self.turn, "turn started");
        self.transcript
            .begin_turn(num_players, self.constants.max_queued_moves);

        // 1. Retrieve moves: parallel fan-out, join-all, then sequential
        // consumption in player order.
        let living: Vec<bool> = (0..num_players).map(|p| self.map.has_ships(p)).collect();
        let responses = moves::retrieve_all_moves(&mut self.providers, &living, &self.map);
        let mut queues: Vec<MoveQueue> = vec![MoveQueue::default(); num_players];
        for (player, response) in responses.into_iter().enumerate() {
            if !living[player] {
                continue;
            }
            match response.and_then(|r| r.elapsed_ms.map(|ms| (ms, r.queue))) {
                Some((ms, queue)) => {
                    self.frame_response_ms[player].push(ms);
                    queues[player] = queue;
                }
                None => {
                    warn!(player, turn = self.turn, "player timed out; removing");
                    self.timeout_tags.insert(player);
                    self.kill_player(player);
                }
            }
        }

        // 2. Docking tick.
        self.process_docking();

        // 3. Micro-steps.
        for move_no in 0..self.constants.max_queued_moves {
            self.process_moves(&queues, move_no);
            let events = detect::find_events(&self.map, &self.constants);
            let mut resolver = Resolver::new(
                &mut self.map,
                &self.constants,
                self.transcript.current_events_mut(),
                &mut self.damage_dealt,
            );
            resolver.resolve(events);
            self.advance_positions();
        }

        // 4. Housekeeping.
        self.process_production();
        self.process_drag();
        self.process_cooldowns();

        // 5. Snapshot.
        self.transcript.record_frame(self.map.clone());

        // 6. Termination check.
        let living = self.find_living_players();
        for (player, &alive) in living.iter().enumerate() {
            if alive {
                self.last_frame_alive[player] = self.turn;
            }
        }
        living
    }

    /// Play the game to completion and return the outcome. The transcript's
    /// stats block is filled in before returning.
    pub fn run(&mut self) -> GameOutcome {
        if !self.initialized {
            self.initialize();
        }
        loop {
            let living = self.process_turn();
            let living_count = living.iter().filter(|&&alive| alive).count();
            let finished = if self.map.num_players() == 1 {
                living_count == 0
            } else {
                living_count <= 1
            };
            if finished || self.turn >= self.max_turns {
                let winner = if self.map.num_players() > 1 && living_count == 1 {
                    living.iter().position(|&alive| alive)
                } else {
                    None
                };
                self.finalize();
                debug!(turns = self.turn, ?winner, "game over");
                return GameOutcome { winner, turns: self.turn };
            }
        }
    }

    /// Remove a player from the game: their ships vanish without side
    /// effects (no explosions, no events) and their planets become unowned
    /// with empty docked lists. Idempotent.
    pub fn kill_player(&mut self, player: PlayerId) {
        let ship_ids: Vec<EntityId> = self
            .map
            .player_ships(player)
            .keys()
            .map(|&ship| EntityId::Ship { player, ship })
            .collect();
        for id in ship_ids {
            self.map.unsafe_kill_entity(id);
        }
        self.map.cleanup_entities();
        for (_, planet) in self.map.each_planet_mut() {
            if planet.owner == Some(player) {
                planet.owner = None;
                planet.docked_ships.clear();
            }
        }
    }

    // -- docking tick ---------------------------------------------------------

    fn process_docking(&mut self) {
        for id in self.map.ship_ids() {
            let Some(ship) = self.map.ship(id) else {
                continue;
            };
            let status = ship.docking_status;
            let attached = ship.docked_planet;
            match status {
                DockingStatus::Docking => {
                    if let Some(ship) = self.map.ship_mut(id) {
                        ship.docking_progress = ship.docking_progress.saturating_sub(1);
                        if ship.docking_progress == 0 {
                            ship.docking_status = DockingStatus::Docked;
                        }
                    }
                }
                DockingStatus::Undocking => {
                    let mut finished = false;
                    if let Some(ship) = self.map.ship_mut(id) {
                        ship.docking_progress = ship.docking_progress.saturating_sub(1);
                        if ship.docking_progress == 0 {
                            ship.docking_status = DockingStatus::Undocked;
                            ship.docked_planet = None;
                            finished = true;
                        }
                    }
                    if finished {
                        if let (Some(planet_index), EntityId::Ship { ship: ship_index, .. }) =
                            (attached, id)
                        {
                            if let Some(planet) = self.map.planet_mut(planet_index) {
                                planet.remove_docked_ship(ship_index);
                            }
                        }
                    }
                }
                DockingStatus::Docked => {
                    let amount = self.constants.docked_ship_regeneration;
                    let max = self.constants.max_ship_health;
                    if amount > 0 {
                        if let Some(ship) = self.map.ship_mut(id) {
                            ship.heal(amount, max);
                        }
                    }
                }
                DockingStatus::Undocked => {}
            }
        }

        // Unfreeze by mutable reference, so the write actually lands.
        for (_, planet) in self.map.each_planet_mut() {
            planet.frozen = false;
        }
    }

    // -- moves ----------------------------------------------------------------

    fn process_moves(&mut self, queues: &[MoveQueue], move_no: usize) {
        for player in 0..self.map.num_players() {
            let step_moves: Vec<Move> = queues[player]
                .step(move_no)
                .map(|step| step.values().copied().collect())
                .unwrap_or_default();
            let mut applied = Vec::new();
            for mv in step_moves {
                if self.apply_move(player, mv) {
                    applied.push(mv);
                }
            }
            self.transcript.record_moves(player, move_no, applied);
        }
    }

    /// Apply one move. Returns whether the move addressed a living ship of
    /// this player (and so belongs in the transcript); illegal moves on a
    /// living ship are ignored but still recorded.
    fn apply_move(&mut self, player: PlayerId, mv: Move) -> bool {
        let Some(ship_index) = mv.ship() else {
            return false;
        };
        let id = EntityId::Ship { player, ship: ship_index };
        if !self.map.is_valid(id) {
            return false;
        }
        match mv {
            Move::Thrust { thrust, angle, .. } => {
                let Some(ship) = self.map.ship_mut(id) else {
                    return false;
                };
                if ship.docking_status != DockingStatus::Undocked {
                    debug!(%id, "thrust ignored: ship is not undocked");
                    return true;
                }
                ship.velocity
                    .accelerate_by(thrust as f64, (angle as f64).to_radians());
            }
            Move::Dock { planet: planet_index, .. } => {
                self.apply_dock(player, id, planet_index);
            }
            Move::Undock { .. } => {
                let Some(ship) = self.map.ship_mut(id) else {
                    return false;
                };
                if ship.docking_status != DockingStatus::Docked {
                    debug!(%id, "undock ignored: ship is not docked");
                    return true;
                }
                ship.docking_status = DockingStatus::Undocking;
                ship.docking_progress = self.constants.dock_turns;
            }
            Move::Noop | Move::Error => return false,
        }
        true
    }

    fn apply_dock(&mut self, player: PlayerId, id: EntityId, planet_index: usize) {
        let EntityId::Ship { ship: ship_index, .. } = id else {
            return;
        };
        let Some(ship) = self.map.ship(id) else {
            return;
        };
        if ship.docking_status != DockingStatus::Undocked || !ship.velocity.is_zero() {
            debug!(%id, "dock ignored: ship is moving or not undocked");
            return;
        }
        if !self.map.is_valid(EntityId::Planet(planet_index)) {
            debug!(%id, planet = planet_index, "dock ignored: no such planet");
            return;
        }
        let (frozen, in_reach, owner) = {
            let ship = match self.map.ship(id) {
                Some(s) => s,
                None => return,
            };
            let planet = match self.map.planet(planet_index) {
                Some(p) => p,
                None => return,
            };
            let reach = ship.radius + planet.radius + self.constants.dock_radius;
            (
                planet.frozen,
                ship.location.distance_to(planet.location) <= reach,
                planet.owner,
            )
        };
        if frozen {
            debug!(%id, planet = planet_index, "dock ignored: planet is frozen");
            return;
        }
        if !in_reach {
            debug!(%id, planet = planet_index, "dock ignored: out of reach");
            return;
        }

        // An unowned planet is claimed by the first docker.
        let owner = match owner {
            Some(owner) => owner,
            None => {
                if let Some(planet) = self.map.planet_mut(planet_index) {
                    planet.owner = Some(player);
                }
                debug!(planet = planet_index, player, "planet claimed");
                player
            }
        };

        if owner == player {
            let has_spot = self
                .map
                .planet(planet_index)
                .is_some_and(|p| p.has_free_spot());
            if !has_spot {
                debug!(%id, planet = planet_index, "dock ignored: no free spot");
                return;
            }
            if let Some(planet) = self.map.planet_mut(planet_index) {
                planet.docked_ships.push(ship_index);
            }
            if let Some(ship) = self.map.ship_mut(id) {
                ship.docking_status = DockingStatus::Docking;
                ship.docking_progress = self.constants.dock_turns;
                ship.docked_planet = Some(planet_index);
            }
            return;
        }

        // Contended claim: if every docked ship is in its very first docking
        // step (the whole roster was filled this turn), the planet freezes,
        // its ownership voids, and those ships are shaken loose.
        let first_step_roster: Option<Vec<usize>> = {
            let Some(planet) = self.map.planet(planet_index) else {
                return;
            };
            let all_first_step = planet.docked_ships.iter().all(|&s| {
                self.map
                    .ship(EntityId::Ship { player: owner, ship: s })
                    .is_some_and(|docked| {
                        docked.docking_status == DockingStatus::Docking
                            && docked.docking_progress == self.constants.dock_turns
                    })
            });
            all_first_step.then(|| planet.docked_ships.clone())
        };
        match first_step_roster {
            Some(roster) => {
                for docked_index in roster {
                    let docked_id = EntityId::Ship { player: owner, ship: docked_index };
                    if let Some(docked) = self.map.ship_mut(docked_id) {
                        docked.reset_docking();
                    }
                }
                if let Some(planet) = self.map.planet_mut(planet_index) {
                    planet.docked_ships.clear();
                    planet.owner = None;
                    planet.frozen = true;
                }
                debug!(planet = planet_index, "planet frozen by docking contention");
            }
            None => {
                debug!(%id, planet = planet_index, "dock ignored: enemy planet");
            }
        }
    }

    // -- simulation phases ----------------------------------------------------

    fn advance_positions(&mut self) {
        for id in self.map.ship_ids() {
            if let Some(ship) = self.map.ship_mut(id) {
                let velocity = ship.velocity;
                ship.location.move_by(velocity, 1.0);
            }
        }
    }

    fn process_production(&mut self) {
        for planet_index in self.map.planet_ids() {
            let (owner, docked_count, location, radius) = {
                let Some(planet) = self.map.planet(planet_index) else {
                    continue;
                };
                let Some(owner) = planet.owner else {
                    continue;
                };
                let docked_count = planet
                    .docked_ships
                    .iter()
                    .filter(|&&s| {
                        self.map
                            .ship(EntityId::Ship { player: owner, ship: s })
                            .is_some_and(|ship| ship.docking_status == DockingStatus::Docked)
                    })
                    .count() as u64;
                (owner, docked_count, planet.location, planet.radius)
            };
            if docked_count == 0 {
                continue;
            }

            let per_turn = self.constants.base_productivity
                + (docked_count - 1) * self.constants.additional_productivity;
            if let Some(planet) = self.map.planet_mut(planet_index) {
                let gain = per_turn.min(planet.remaining_production);
                planet.remaining_production -= gain;
                planet.current_production += gain;
            }

            while self
                .map
                .planet(planet_index)
                .is_some_and(|p| p.current_production >= self.constants.production_per_ship)
            {
                let Some(site) = self.find_spawn_site(location, radius) else {
                    // No room around the planet; production carries over.
                    break;
                };
                if let Some(planet) = self.map.planet_mut(planet_index) {
                    planet.current_production -= self.constants.production_per_ship;
                }
                let ship_index = self.map.spawn_ship(site, owner, &self.constants);
                self.total_ship_count[owner] += 1;
                self.transcript.record_event(GameEvent::Spawn {
                    ship: EntityId::Ship { player: owner, ship: ship_index },
                    location: site,
                    planet_location: location,
                });
            }
        }
    }

    /// Scan integer offsets around the planet for a clear spawn site,
    /// preferring the candidate closest to the map center. Ties keep the
    /// first candidate in scan order (ascending dx, then dy).
    fn find_spawn_site(&self, center: Location, planet_radius: f64) -> Option<Location> {
        let map_center = Location::new(self.map.width() / 2.0, self.map.height() / 2.0);
        let clearance = self.constants.ship_radius * 2.0;
        let extent = self.constants.spawn_radius;

        let mut best: Option<(f64, Location)> = None;
        for dx in -extent..=extent {
            for dy in -extent..=extent {
                let theta = (dy as f64).atan2(dx as f64);
                let offset_x = dx as f64 + planet_radius * theta.cos();
                let offset_y = dy as f64 + planet_radius * theta.sin();
                let Some(site) = self.map.location_with_delta(center, offset_x, offset_y) else {
                    continue;
                };
                if !self.map.test(site, clearance).is_empty() {
                    continue;
                }
                let distance = site.distance_to(map_center);
                if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                    best = Some((distance, site));
                }
            }
        }
        best.map(|(_, site)| site)
    }

    fn process_drag(&mut self) {
        let drag = self.constants.drag;
        for id in self.map.ship_ids() {
            if let Some(ship) = self.map.ship_mut(id) {
                let speed = ship.velocity.magnitude();
                if speed <= drag {
                    ship.velocity = parsec_world::geom::Velocity::ZERO;
                } else {
                    let reverse = ship.velocity.angle() + std::f64::consts::PI;
                    ship.velocity.accelerate_by(drag, reverse);
                }
            }
        }
    }

    fn process_cooldowns(&mut self) {
        for id in self.map.ship_ids() {
            if let Some(ship) = self.map.ship_mut(id) {
                if ship.weapon_cooldown > 0 {
                    ship.weapon_cooldown -= 1;
                }
            }
        }
    }

    // -- termination ----------------------------------------------------------

    /// A player is alive iff they have at least one ship. Additionally, if a
    /// single player owns every live planet that hosts a completed-docking
    /// ship, that player wins immediately and everyone else is killed off
    /// this frame.
    fn find_living_players(&mut self) -> Vec<bool> {
        let num_players = self.map.num_players();
        let mut living: Vec<bool> = (0..num_players).map(|p| self.map.has_ships(p)).collect();

        let mut sole_owner: Option<PlayerId> = None;
        let mut contested = false;
        let mut any_productive_planet = false;
        for (_, planet) in self.map.each_planet() {
            let Some(owner) = planet.owner else {
                continue;
            };
            let has_docked = planet.docked_ships.iter().any(|&s| {
                self.map
                    .ship(EntityId::Ship { player: owner, ship: s })
                    .is_some_and(|ship| ship.docking_status == DockingStatus::Docked)
            });
            if !has_docked {
                continue;
            }
            any_productive_planet = true;
            match sole_owner {
                None => sole_owner = Some(owner),
                Some(existing) if existing != owner => {
                    contested = true;
                    break;
                }
                Some(_) => {}
            }
        }

        if any_productive_planet && !contested {
            if let Some(winner) = sole_owner {
                let living_count = living.iter().filter(|&&alive| alive).count();
                if living[winner] && living_count > 1 {
                    debug!(winner, "full planet control; game decided");
                    for player in 0..num_players {
                        if player != winner && living[player] {
                            self.kill_player(player);
                            living[player] = false;
                        }
                    }
                }
            }
        }

        living
    }

    // -- stats ----------------------------------------------------------------

    fn finalize(&mut self) {
        let num_players = self.map.num_players();
        let mut order: Vec<PlayerId> = (0..num_players).collect();
        order.sort_by(|&a, &b| {
            self.last_frame_alive[b]
                .cmp(&self.last_frame_alive[a])
                .then(self.total_ship_count[b].cmp(&self.total_ship_count[a]))
                .then(self.damage_dealt[b].cmp(&self.damage_dealt[a]))
                .then(a.cmp(&b))
        });

        let mut players: Vec<PlayerStatistics> = (0..num_players)
            .map(|player| {
                let times = &self.frame_response_ms[player];
                let avg = if times.is_empty() {
                    0.0
                } else {
                    times.iter().sum::<u64>() as f64 / times.len() as f64
                };
                PlayerStatistics {
                    rank: 0,
                    last_frame_alive: self.last_frame_alive[player],
                    init_response_time: self.init_response_ms[player],
                    avg_frame_response_time: avg,
                    total_ship_count: self.total_ship_count[player],
                    damage_dealt: self.damage_dealt[player],
                }
            })
            .collect();
        for (position, &player) in order.iter().enumerate() {
            players[player].rank = position as u32 + 1;
        }

        self.transcript.set_stats(GameStatistics {
            players,
            timeout_tags: self.timeout_tags.iter().copied().collect(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
