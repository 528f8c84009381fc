use super::*;

impl GameEngine {
    pub(super) fn apply_pickups(&mut self) {
        let cell = self.player.cell(&self.grid);
        match self.grid.take_collectible(cell) {
            Some(Collectible::Point) => {
                self.score += POINT_SCORE;
                self.events.push(RuntimeEvent::PointEaten {
                    col: cell.col,
                    row: cell.row,
                });
            }
            Some(Collectible::PowerPellet) => {
                self.score += POWER_PELLET_SCORE;
                for ghost in &mut self.ghosts {
                    ghost.make_vulnerable(self.options.vulnerable_ticks);
                }
                self.events.push(RuntimeEvent::PowerPelletEaten {
                    col: cell.col,
                    row: cell.row,
                });
            }
            Some(Collectible::Empty) | None => {}
        }
    }

    /// Returns true when the player lost a life; the rest of the tick is skipped.
    pub(super) fn resolve_player_collision(&mut self, idx: usize) -> bool {
        let ghost = &self.ghosts[idx];
        if !ghost.touches_player(self.player.position(), &self.grid) {
            return false;
        }
        match ghost.state() {
            GhostState::Eaten => false,
            GhostState::Vulnerable => {
                let ghost_id = ghost.id().to_string();
                self.ghosts[idx].mark_eaten();
                self.score += GHOST_EATEN_SCORE;
                log::debug!("{ghost_id} eaten at tick {}", self.tick_counter);
                self.events.push(RuntimeEvent::GhostEaten {
                    ghost_id,
                    score: GHOST_EATEN_SCORE,
                });
                false
            }
            GhostState::Normal => {
                let ghost_id = ghost.id().to_string();
                self.lose_life(ghost_id);
                true
            }
        }
    }

    fn lose_life(&mut self, ghost_id: String) {
        self.lives = self.lives.saturating_sub(1);
        log::info!(
            "life lost to {ghost_id} at tick {}, {} remaining",
            self.tick_counter,
            self.lives
        );
        self.events.push(RuntimeEvent::LifeLost {
            ghost_id,
            lives: self.lives,
        });

        if self.lives == 0 {
            self.ended = true;
            self.end_reason = Some(GameOverReason::OutOfLives);
            log::info!("game over at tick {} with score {}", self.tick_counter, self.score);
            self.events.push(RuntimeEvent::GameOver {
                reason: GameOverReason::OutOfLives,
            });
            return;
        }

        self.player.reset_to_start();
        for ghost in &mut self.ghosts {
            ghost.revert_to_normal(&self.grid, &mut self.rng);
        }
    }

    /// Each ghost takes part in at most one collision per tick.
    pub(super) fn resolve_ghost_collisions(&mut self) {
        let count = self.ghosts.len();
        let mut collided = vec![false; count];
        for a in 0..count {
            if collided[a] {
                continue;
            }
            for b in (a + 1)..count {
                if collided[b] || !self.ghosts[a].collides_with(&self.ghosts[b], &self.grid) {
                    continue;
                }
                collided[a] = true;
                collided[b] = true;
                self.events.push(RuntimeEvent::GhostsCollided {
                    a: self.ghosts[a].id().to_string(),
                    b: self.ghosts[b].id().to_string(),
                });
                for idx in [a, b] {
                    self.ghosts[idx].react_to_collision(&self.grid, &mut self.rng);
                }
                break;
            }
        }
    }
}
