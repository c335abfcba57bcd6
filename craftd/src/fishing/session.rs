//! Fishing session state machine
//!
//! Unlike the craft/gather orchestrators the session has no task queue and no
//! parent: it runs until told to stop or until an unrecoverable error. All
//! completion signals come from world probes; the session never learns what
//! was caught, only that the "currently fishing" flag fell.

use std::sync::Arc;

use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::collab::{ActionIssuer, Mover, WorldProbe};
use crate::events::EventEmitter;

use super::config::{BuffPolicy, FishingConfig};
use super::spots::{FishingSpot, nearest_spot};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    ValidatingPrereqs,
    NavigatingToSpot,
    PreFishing,
    Fishing,
    WaitingForGp,
    Stopped,
    Error,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Stopped | SessionState::Error)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::ValidatingPrereqs => "validating_prereqs",
            SessionState::NavigatingToSpot => "navigating_to_spot",
            SessionState::PreFishing => "pre_fishing",
            SessionState::Fishing => "fishing",
            SessionState::WaitingForGp => "waiting_for_gp",
            SessionState::Stopped => "stopped",
            SessionState::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Ordered preparation sequence before each cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreFishStep {
    Dismount,
    QualityBuff,
    SecondaryBuff,
    Cast,
}

/// Supervised fishing loop
pub struct FishingSession {
    config: FishingConfig,
    world: Arc<dyn WorldProbe>,
    mover: Arc<dyn Mover>,
    actions: Arc<dyn ActionIssuer>,
    clock: Arc<dyn Clock>,
    emitter: EventEmitter,

    spots: Vec<FishingSpot>,
    state: SessionState,
    status: String,
    last_error: Option<String>,

    catches: u32,
    started_at_ms: u64,
    target: Option<FishingSpot>,
    step: PreFishStep,
    was_fishing: bool,

    // Timing bookkeeping, all in clock milliseconds
    last_poll_ms: Option<u64>,
    last_action_ms: Option<u64>,
    last_active_ms: u64,
    last_recheck_ms: u64,
    last_cordial_ms: Option<u64>,
    nav_deadline_ms: u64,
    required_gp: u32,
}

impl FishingSession {
    pub fn new(
        world: Arc<dyn WorldProbe>,
        mover: Arc<dyn Mover>,
        actions: Arc<dyn ActionIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        debug!("FishingSession::new: called");
        Self {
            config: FishingConfig::default(),
            world,
            mover,
            actions,
            clock,
            emitter: EventEmitter::disconnected("fishing"),
            spots: super::spots::default_spots(),
            state: SessionState::Idle,
            status: "idle".to_string(),
            last_error: None,
            catches: 0,
            started_at_ms: 0,
            target: None,
            step: PreFishStep::Dismount,
            was_fishing: false,
            last_poll_ms: None,
            last_action_ms: None,
            last_active_ms: 0,
            last_recheck_ms: 0,
            last_cordial_ms: None,
            nav_deadline_ms: 0,
            required_gp: 0,
        }
    }

    pub fn with_config(mut self, config: FishingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_spots(mut self, spots: Vec<FishingSpot>) -> Self {
        self.spots = spots;
        self
    }

    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }

    pub fn catches(&self) -> u32 {
        self.catches
    }

    /// Clock time at which the current session started
    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Begin a fresh session
    ///
    /// Resets the catch counter and all timers; the first `update` runs the
    /// prerequisite checks.
    pub fn start(&mut self) {
        info!("FishingSession::start: starting session");
        self.catches = 0;
        self.started_at_ms = self.clock.now_ms();
        self.target = None;
        self.step = PreFishStep::Dismount;
        self.was_fishing = false;
        self.last_poll_ms = None;
        self.last_action_ms = None;
        self.last_cordial_ms = None;
        self.last_error = None;
        self.required_gp = 0;
        self.set_status("validating prerequisites");
        self.transition(SessionState::ValidatingPrereqs);
    }

    /// Stop the session, halting any navigation in flight
    pub fn stop(&mut self) {
        debug!(state = %self.state, "FishingSession::stop: called");
        if self.state == SessionState::NavigatingToSpot {
            self.mover.stop();
        }
        if !self.state.is_terminal() {
            self.set_status(&format!("stopped after {} catches", self.catches));
            self.transition(SessionState::Stopped);
        }
    }

    /// Drive the session one step
    ///
    /// Rate-limited to the poll interval in every state except navigation,
    /// which re-checks arrival on every call. Any error raised by a handler
    /// moves the session to Error instead of propagating.
    pub fn update(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        let now = self.clock.now_ms();
        if self.state != SessionState::NavigatingToSpot {
            if let Some(last) = self.last_poll_ms {
                if now.saturating_sub(last) < self.config.poll_interval_ms {
                    return;
                }
            }
            self.last_poll_ms = Some(now);
        }

        let result = match self.state {
            SessionState::ValidatingPrereqs => self.tick_validating(now),
            SessionState::NavigatingToSpot => self.tick_navigating(now),
            SessionState::PreFishing => self.tick_prefishing(now),
            SessionState::Fishing => self.tick_fishing(now),
            SessionState::WaitingForGp => self.tick_waiting_for_gp(now),
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.fail(&format!("{e:#}"));
        }
    }

    // === State handlers ===

    fn tick_validating(&mut self, now: u64) -> Result<()> {
        debug!("FishingSession::tick_validating: checking prerequisites");
        if !self.world.can_fish() {
            eyre::bail!("current job cannot fish");
        }

        let here = self.world.position();
        let spot = nearest_spot(&here, self.config.spot_radius, &self.spots)
            .ok_or_else(|| {
                eyre::eyre!("no fishing spot within {:.0} units", self.config.spot_radius)
            })?
            .clone();

        let distance = here.distance_to(&spot.position);
        info!(spot = %spot.name, distance, "FishingSession::tick_validating: spot selected");
        self.target = Some(spot.clone());

        if distance <= self.config.arrival_distance {
            self.enter_prefishing(now, PreFishStep::Dismount);
            return Ok(());
        }

        if !self.mover.is_available() {
            eyre::bail!("mover is not available");
        }
        self.mover.move_to(spot.position)?;
        self.nav_deadline_ms = now + self.config.nav_timeout_ms;
        self.set_status(&format!("navigating to {}", spot.name));
        self.transition(SessionState::NavigatingToSpot);
        Ok(())
    }

    fn tick_navigating(&mut self, now: u64) -> Result<()> {
        let spot = self
            .target
            .clone()
            .ok_or_else(|| eyre::eyre!("navigating with no target spot"))?;
        let distance = self.world.position().distance_to(&spot.position);
        debug!(spot = %spot.name, distance, "FishingSession::tick_navigating: polling");

        if distance <= self.config.arrival_distance {
            info!(spot = %spot.name, "FishingSession::tick_navigating: arrived");
            self.mover.stop();
            self.enter_prefishing(now, PreFishStep::Dismount);
            return Ok(());
        }

        if now >= self.nav_deadline_ms {
            eyre::bail!(
                "navigation to {} timed out after {}ms",
                spot.name,
                self.config.nav_timeout_ms
            );
        }

        // The mover occasionally drops a path mid-route; re-issue rather than
        // treating it as fatal.
        if !self.mover.is_path_running() && !self.mover.is_pathfind_in_progress() {
            warn!(spot = %spot.name, "FishingSession::tick_navigating: path lost, re-issuing");
            self.mover.move_to(spot.position)?;
        }
        Ok(())
    }

    fn tick_prefishing(&mut self, now: u64) -> Result<()> {
        // The world flag going up means a cast is already live, whoever
        // issued it.
        if self.world.is_fishing() {
            self.enter_fishing(now);
            return Ok(());
        }

        if let Some(last) = self.last_action_ms {
            if now.saturating_sub(last) < self.config.action_cooldown_ms {
                return Ok(());
            }
        }

        loop {
            match self.step {
                PreFishStep::Dismount => {
                    if self.world.is_mounted() {
                        debug!("FishingSession::tick_prefishing: dismounting");
                        self.actions.use_action(self.config.dismount_action_id)?;
                        self.last_action_ms = Some(now);
                        self.step = PreFishStep::QualityBuff;
                        return Ok(());
                    }
                    self.step = PreFishStep::QualityBuff;
                }
                PreFishStep::QualityBuff => {
                    let buff = self.config.quality_buff.clone();
                    if self.try_apply_buff(&buff, now)? {
                        self.step = PreFishStep::SecondaryBuff;
                        return Ok(());
                    }
                    self.step = PreFishStep::SecondaryBuff;
                }
                PreFishStep::SecondaryBuff => {
                    let buff = self.config.secondary_buff.clone();
                    if self.try_apply_buff(&buff, now)? {
                        self.step = PreFishStep::Cast;
                        return Ok(());
                    }
                    self.step = PreFishStep::Cast;
                }
                PreFishStep::Cast => {
                    debug!("FishingSession::tick_prefishing: casting");
                    self.actions.use_action(self.config.cast_action_id)?;
                    self.last_action_ms = Some(now);
                    self.enter_fishing(now);
                    return Ok(());
                }
            }
        }
    }

    fn tick_fishing(&mut self, now: u64) -> Result<()> {
        let fishing = self.world.is_fishing();

        if self.was_fishing && !fishing {
            self.catches += 1;
            info!(total = self.catches, "FishingSession::tick_fishing: catch recorded");
            self.set_status(&format!("{} catches", self.catches));
            self.emitter.catch_recorded(self.catches);
        }
        if fishing {
            self.last_active_ms = now;
        }
        self.was_fishing = fishing;

        if fishing {
            return Ok(());
        }

        // Idle between casts from here down.
        if now.saturating_sub(self.last_active_ms) > self.config.stall_threshold_ms {
            warn!(
                idle_ms = now - self.last_active_ms,
                "FishingSession::tick_fishing: no activity, assuming lost cast"
            );
            self.enter_prefishing(now, PreFishStep::Cast);
            return Ok(());
        }

        if now.saturating_sub(self.last_recheck_ms) >= self.config.buff_recheck_ms {
            self.last_recheck_ms = now;

            if self.any_buff_lapsed_and_affordable() {
                debug!("FishingSession::tick_fishing: buff lapsed, re-applying");
                self.enter_prefishing(now, PreFishStep::QualityBuff);
                return Ok(());
            }

            if self.config.gp_floor_enabled {
                let required = self.gp_needed_for_buffs();
                if required > 0 && self.world.gp() < required {
                    info!(
                        required,
                        gp = self.world.gp(),
                        "FishingSession::tick_fishing: below GP floor"
                    );
                    self.required_gp = required;
                    self.set_status(&format!("waiting for {required} GP"));
                    self.transition(SessionState::WaitingForGp);
                }
            }
        }
        Ok(())
    }

    fn tick_waiting_for_gp(&mut self, now: u64) -> Result<()> {
        if self.world.gp() >= self.required_gp {
            debug!(gp = self.world.gp(), "FishingSession::tick_waiting_for_gp: recovered");
            self.enter_prefishing(now, PreFishStep::QualityBuff);
            return Ok(());
        }

        if self.config.cordial.enabled {
            let off_cooldown = match self.last_cordial_ms {
                Some(last) => now.saturating_sub(last) >= self.config.cordial.cooldown_ms,
                None => true,
            };
            if off_cooldown {
                debug!("FishingSession::tick_waiting_for_gp: drinking cordial");
                self.actions.use_action(self.config.cordial.action_id)?;
                self.last_cordial_ms = Some(now);
            }
        }
        Ok(())
    }

    // === Helpers ===

    /// Apply a buff when it is enabled, missing, and affordable; true when an
    /// action was issued
    fn try_apply_buff(&mut self, buff: &BuffPolicy, now: u64) -> Result<bool> {
        if !buff.enabled || self.world.has_status(buff.status_id) {
            return Ok(false);
        }
        if self.world.gp() < buff.gp_cost {
            debug!(buff = %buff.name, gp = self.world.gp(), "FishingSession::try_apply_buff: cannot afford, skipping");
            return Ok(false);
        }
        debug!(buff = %buff.name, "FishingSession::try_apply_buff: applying");
        self.actions.use_action(buff.action_id)?;
        self.last_action_ms = Some(now);
        Ok(true)
    }

    fn any_buff_lapsed_and_affordable(&self) -> bool {
        [&self.config.quality_buff, &self.config.secondary_buff]
            .into_iter()
            .any(|b| b.enabled && !self.world.has_status(b.status_id) && self.world.gp() >= b.gp_cost)
    }

    /// GP needed to re-apply every enabled buff that is currently missing
    fn gp_needed_for_buffs(&self) -> u32 {
        [&self.config.quality_buff, &self.config.secondary_buff]
            .into_iter()
            .filter(|b| b.enabled && !self.world.has_status(b.status_id))
            .map(|b| b.gp_cost)
            .sum()
    }

    fn enter_prefishing(&mut self, now: u64, step: PreFishStep) {
        debug!(?step, "FishingSession::enter_prefishing");
        self.step = step;
        self.last_active_ms = now;
        self.set_status("preparing to fish");
        self.transition(SessionState::PreFishing);
    }

    fn enter_fishing(&mut self, now: u64) {
        // Start from a clean edge detector: the next flag-up poll arms it.
        self.was_fishing = false;
        self.last_active_ms = now;
        self.last_recheck_ms = now;
        self.set_status("fishing");
        self.transition(SessionState::Fishing);
    }

    fn fail(&mut self, message: &str) {
        warn!(state = %self.state, message, "FishingSession::fail");
        self.last_error = Some(message.to_string());
        self.set_status(message);
        self.emitter.error(&self.state.to_string(), message);
        self.transition(SessionState::Error);
    }

    fn set_status(&mut self, status: &str) {
        if self.status != status {
            self.status = status.to_string();
            self.emitter.status_changed(status);
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state == to {
            return;
        }
        debug!(from = %self.state, to = %to, "FishingSession::transition");
        self.emitter.session_state_changed(&self.state.to_string(), &to.to_string());
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::collab::sim::{ManualActions, ManualMover, ManualWorld};
    use crate::domain::Vec3;

    const POLL: u64 = 500;
    const COOLDOWN: u64 = 1_500;

    const DISMOUNT: u32 = 1;
    const QUALITY: u32 = 2;
    const SECONDARY: u32 = 3;
    const CAST: u32 = 4;
    const CORDIAL: u32 = 5;

    const QUALITY_STATUS: u32 = 102;
    const SECONDARY_STATUS: u32 = 103;

    struct Rig {
        world: Arc<ManualWorld>,
        mover: Arc<ManualMover>,
        actions: Arc<ManualActions>,
        clock: Arc<ManualClock>,
        session: FishingSession,
    }

    fn test_config() -> FishingConfig {
        FishingConfig {
            dismount_action_id: DISMOUNT,
            cast_action_id: CAST,
            quality_buff: BuffPolicy {
                enabled: true,
                name: "quality".into(),
                action_id: QUALITY,
                status_id: QUALITY_STATUS,
                gp_cost: 500,
            },
            secondary_buff: BuffPolicy {
                enabled: true,
                name: "secondary".into(),
                action_id: SECONDARY,
                status_id: SECONDARY_STATUS,
                gp_cost: 100,
            },
            cordial: crate::fishing::CordialPolicy {
                enabled: true,
                action_id: CORDIAL,
                gp_restored: 300,
                cooldown_ms: 90_000,
            },
            ..FishingConfig::default()
        }
    }

    fn rig() -> Rig {
        let world = Arc::new(ManualWorld::new());
        let mover = Arc::new(ManualMover::new());
        let actions = Arc::new(ManualActions::new());
        let clock = ManualClock::new();

        world.set_gp(800);

        let session = FishingSession::new(
            world.clone() as Arc<dyn WorldProbe>,
            mover.clone() as Arc<dyn Mover>,
            actions.clone() as Arc<dyn ActionIssuer>,
            clock.clone() as Arc<dyn Clock>,
        )
        .with_config(test_config())
        .with_spots(vec![FishingSpot::new("pond", Vec3::new(0.0, 0.0, 0.0))]);

        Rig { world, mover, actions, clock, session }
    }

    /// Advance past the poll gate and tick once
    fn poll(rig: &mut Rig) {
        rig.clock.advance(POLL);
        rig.session.update();
    }

    /// Advance past the action cooldown and tick once
    fn action_poll(rig: &mut Rig) {
        rig.clock.advance(COOLDOWN);
        rig.session.update();
    }

    #[test]
    fn test_prereq_failure_enters_error() {
        let mut rig = rig();
        rig.world.set_can_fish(false);

        rig.session.start();
        poll(&mut rig);

        assert_eq!(rig.session.state(), SessionState::Error);
        assert!(rig.session.last_error().unwrap().contains("cannot fish"));
    }

    #[test]
    fn test_no_spot_in_radius_enters_error() {
        let mut rig = rig();
        rig.world.set_position(Vec3::new(9_000.0, 0.0, 9_000.0));

        rig.session.start();
        poll(&mut rig);

        assert_eq!(rig.session.state(), SessionState::Error);
        assert!(rig.session.last_error().unwrap().contains("no fishing spot"));
    }

    #[test]
    fn test_already_at_spot_skips_navigation() {
        let mut rig = rig();
        rig.world.set_position(Vec3::new(1.0, 0.0, 1.0));

        rig.session.start();
        poll(&mut rig);

        assert_eq!(rig.session.state(), SessionState::PreFishing);
        assert!(rig.mover.move_targets().is_empty());
    }

    #[test]
    fn test_navigates_then_prepares() {
        let mut rig = rig();
        rig.world.set_position(Vec3::new(100.0, 0.0, 0.0));

        rig.session.start();
        poll(&mut rig);
        assert_eq!(rig.session.state(), SessionState::NavigatingToSpot);
        assert_eq!(rig.mover.move_targets().len(), 1);

        // Still en route
        rig.clock.advance(100);
        rig.session.update();
        assert_eq!(rig.session.state(), SessionState::NavigatingToSpot);

        rig.world.set_position(Vec3::new(0.5, 0.0, 0.0));
        rig.clock.advance(100);
        rig.session.update();
        assert_eq!(rig.session.state(), SessionState::PreFishing);
        assert_eq!(rig.mover.stop_count(), 1);
    }

    #[test]
    fn test_navigation_reissues_dropped_path() {
        let mut rig = rig();
        rig.world.set_position(Vec3::new(100.0, 0.0, 0.0));

        rig.session.start();
        poll(&mut rig);
        assert_eq!(rig.mover.move_targets().len(), 1);

        rig.mover.set_path_running(false);
        rig.clock.advance(100);
        rig.session.update();
        assert_eq!(rig.mover.move_targets().len(), 2);
    }

    #[test]
    fn test_navigation_timeout_enters_error() {
        let mut rig = rig();
        rig.world.set_position(Vec3::new(100.0, 0.0, 0.0));

        rig.session.start();
        poll(&mut rig);
        assert_eq!(rig.session.state(), SessionState::NavigatingToSpot);

        rig.clock.advance(60_000);
        rig.session.update();
        assert_eq!(rig.session.state(), SessionState::Error);
        assert!(rig.session.last_error().unwrap().contains("timed out"));
    }

    #[test]
    fn test_prefishing_full_sequence() {
        let mut rig = rig();
        rig.world.set_mounted(true);

        rig.session.start();
        poll(&mut rig); // validating -> pre_fishing (already at spot)
        action_poll(&mut rig); // dismount
        action_poll(&mut rig); // quality buff
        rig.world.add_status(QUALITY_STATUS);
        action_poll(&mut rig); // secondary buff
        rig.world.add_status(SECONDARY_STATUS);
        action_poll(&mut rig); // cast

        assert_eq!(rig.actions.used(), vec![DISMOUNT, QUALITY, SECONDARY, CAST]);
        assert_eq!(rig.session.state(), SessionState::Fishing);
    }

    #[test]
    fn test_prefishing_skips_satisfied_steps() {
        let mut rig = rig();
        rig.world.add_status(QUALITY_STATUS);
        rig.world.add_status(SECONDARY_STATUS);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig);

        // Not mounted and both buffs up, so the first action is the cast.
        assert_eq!(rig.actions.used(), vec![CAST]);
        assert_eq!(rig.session.state(), SessionState::Fishing);
    }

    #[test]
    fn test_prefishing_skips_unaffordable_buff() {
        let mut rig = rig();
        rig.world.set_gp(50);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig);

        assert_eq!(rig.actions.used(), vec![CAST]);
    }

    #[test]
    fn test_action_cooldown_respected() {
        let mut rig = rig();
        rig.world.set_mounted(true);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig); // dismount
        poll(&mut rig); // only 500ms later, cooldown not elapsed
        assert_eq!(rig.actions.used(), vec![DISMOUNT]);

        rig.clock.advance(COOLDOWN);
        rig.session.update();
        assert_eq!(rig.actions.used(), vec![DISMOUNT, QUALITY]);
    }

    #[test]
    fn test_falling_edge_counts_one_catch() {
        let mut rig = rig();
        rig.world.add_status(QUALITY_STATUS);
        rig.world.add_status(SECONDARY_STATUS);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig); // cast
        assert_eq!(rig.session.state(), SessionState::Fishing);

        rig.world.set_fishing(true);
        poll(&mut rig); // edge detector arms
        poll(&mut rig);
        assert_eq!(rig.session.catches(), 0);

        rig.world.set_fishing(false);
        poll(&mut rig);
        assert_eq!(rig.session.catches(), 1);

        // Staying down does not double count.
        poll(&mut rig);
        poll(&mut rig);
        assert_eq!(rig.session.catches(), 1);
    }

    #[test]
    fn test_stall_recovers_with_recast() {
        let mut rig = rig();
        rig.world.add_status(QUALITY_STATUS);
        rig.world.add_status(SECONDARY_STATUS);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig); // cast
        assert_eq!(rig.session.state(), SessionState::Fishing);

        // The flag never rises; after the stall threshold the session assumes
        // the cast was lost and recasts.
        rig.clock.advance(11_000);
        rig.session.update();
        assert_eq!(rig.session.state(), SessionState::PreFishing);

        action_poll(&mut rig);
        assert_eq!(rig.actions.used(), vec![CAST, CAST]);
        assert_eq!(rig.session.state(), SessionState::Fishing);
    }

    #[test]
    fn test_lapsed_buff_triggers_reapply() {
        let mut rig = rig();
        rig.world.add_status(QUALITY_STATUS);
        rig.world.add_status(SECONDARY_STATUS);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig); // cast
        rig.world.set_fishing(true);
        poll(&mut rig);
        rig.world.set_fishing(false);
        poll(&mut rig);
        assert_eq!(rig.session.catches(), 1);

        rig.world.remove_status(SECONDARY_STATUS);
        rig.clock.advance(5_000);
        rig.session.update();
        assert_eq!(rig.session.state(), SessionState::PreFishing);

        action_poll(&mut rig);
        assert_eq!(rig.actions.used(), vec![CAST, SECONDARY]);
    }

    #[test]
    fn test_gp_floor_parks_and_cordial_recovers() {
        let mut rig = rig();
        rig.world.add_status(QUALITY_STATUS);
        rig.world.add_status(SECONDARY_STATUS);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig); // cast
        rig.world.set_fishing(true);
        poll(&mut rig);
        rig.world.set_fishing(false);
        poll(&mut rig);

        // Both buffs drop and GP cannot cover either of them.
        rig.world.remove_status(QUALITY_STATUS);
        rig.world.remove_status(SECONDARY_STATUS);
        rig.world.set_gp(50);
        rig.clock.advance(5_000);
        rig.session.update();
        assert_eq!(rig.session.state(), SessionState::WaitingForGp);

        poll(&mut rig);
        assert!(rig.actions.used().contains(&CORDIAL));

        rig.world.set_gp(700);
        poll(&mut rig);
        assert_eq!(rig.session.state(), SessionState::PreFishing);
    }

    #[test]
    fn test_action_failure_enters_error() {
        let mut rig = rig();
        rig.actions.fail_next("action rejected");

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig);

        assert_eq!(rig.session.state(), SessionState::Error);
        assert!(rig.session.last_error().unwrap().contains("action rejected"));
    }

    #[test]
    fn test_stop_and_restart_resets_counter() {
        let mut rig = rig();
        rig.world.add_status(QUALITY_STATUS);
        rig.world.add_status(SECONDARY_STATUS);

        rig.session.start();
        poll(&mut rig);
        action_poll(&mut rig);
        rig.world.set_fishing(true);
        poll(&mut rig);
        rig.world.set_fishing(false);
        poll(&mut rig);
        assert_eq!(rig.session.catches(), 1);

        rig.session.stop();
        assert_eq!(rig.session.state(), SessionState::Stopped);
        rig.session.update();
        assert_eq!(rig.session.state(), SessionState::Stopped);

        rig.world.set_fishing(false);
        rig.session.start();
        assert_eq!(rig.session.catches(), 0);
        assert_eq!(rig.session.state(), SessionState::ValidatingPrereqs);
    }
}
