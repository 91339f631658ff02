use crate::caster::Caster;
use crate::map::GridMap;
use glam::Vec2;

/// Index of a caster inside its [`World`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct CasterId(usize);

/// The map plus every entity casting rays into it. One caster may be marked as the player;
/// the others are observers.
pub(crate) struct World {
    map: GridMap,
    casters: Vec<Caster>,
    player: Option<CasterId>,
}

impl World {
    pub fn new(map: GridMap) -> Self {
        Self {
            map,
            casters: vec![],
            player: None,
        }
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn add_caster(&mut self, caster: Caster) -> CasterId {
        self.casters.push(caster);
        CasterId(self.casters.len() - 1)
    }

    pub fn set_player(&mut self, id: CasterId) -> anyhow::Result<()> {
        anyhow::ensure!(id.0 < self.casters.len(), "no caster with id {}", id.0);
        self.player = Some(id);
        Ok(())
    }

    pub fn player_id(&self) -> Option<CasterId> {
        self.player
    }

    pub fn player(&self) -> Option<&Caster> {
        self.player.and_then(|id| self.caster(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Caster> {
        self.player.and_then(|id| self.casters.get_mut(id.0))
    }

    pub fn caster(&self, id: CasterId) -> Option<&Caster> {
        self.casters.get(id.0)
    }

    pub fn casters(&self) -> &[Caster] {
        &self.casters
    }

    /// every caster except the player
    pub fn observers(&self) -> impl Iterator<Item = &Caster> + '_ {
        self.casters
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(CasterId(*idx)) != self.player)
            .map(|(_, caster)| caster)
    }

    /// Drops every observer. The player survives and gets a new id, which is returned.
    pub fn clear_observers(&mut self) -> Option<CasterId> {
        let player = self.player.map(|id| self.casters.swap_remove(id.0));
        self.casters.clear();
        self.player = player.map(|caster| self.add_caster(caster));
        self.player
    }

    /// Moves a caster by `delta`, dropping whichever axis would put it inside a wall.
    pub fn move_caster(&mut self, id: CasterId, delta: Vec2) {
        let Some(caster) = self.casters.get_mut(id.0) else {
            return;
        };

        if !self.map.is_blocked_at(caster.pos + Vec2::new(delta.x, 0.)) {
            caster.pos.x += delta.x;
        }
        if !self.map.is_blocked_at(caster.pos + Vec2::new(0., delta.y)) {
            caster.pos.y += delta.y;
        }
    }

    /// Recasts every caster against the map. `dt` is the frame time in seconds.
    pub fn update(&mut self, dt: f32) {
        log::trace!("casting {} casters, dt {dt:.4}s", self.casters.len());
        for caster in self.casters.iter_mut() {
            caster.cast_all(&self.map);
        }
    }
}
