//! Leader/follower links
//!
//! A follower copies its leader's position `delay` steps after the leader
//! moved. Links only act while recording; playback folds the recorded
//! deltas, which already contain the follower moves.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowLink {
    pub leader: usize,
    pub follower: usize,
    /// Steps between the leader's move and the follower's copy
    pub delay: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowLinks {
    links: Vec<FollowLink>,
}

impl FollowLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the link `leader -> follower`. Self links are ignored.
    pub fn link(&mut self, leader: usize, follower: usize, delay: usize) -> bool {
        if leader == follower {
            return false;
        }
        match self.links.iter_mut().find(|l| l.leader == leader && l.follower == follower) {
            Some(existing) => existing.delay = delay,
            None => self.links.push(FollowLink { leader, follower, delay }),
        }
        true
    }

    /// Drop every link in which `follower` follows someone.
    pub fn unlink_follower(&mut self, follower: usize) -> usize {
        let before = self.links.len();
        self.links.retain(|l| l.follower != follower);
        before - self.links.len()
    }

    /// Drop every link led by `leader`.
    pub fn unlink_leader(&mut self, leader: usize) -> usize {
        let before = self.links.len();
        self.links.retain(|l| l.leader != leader);
        before - self.links.len()
    }

    pub fn followers_of(&self, leader: usize) -> impl Iterator<Item = &FollowLink> + '_ {
        self.links.iter().filter(move |l| l.leader == leader)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FollowLink> + '_ {
        self.links.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}
