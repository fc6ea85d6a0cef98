pub type InstanceId = u32;
pub type TaskId = u32;
pub type SessionId = u32;
pub type DbBalancerId = u32;

/// Generates unique identifiers for instances, tasks, jobs and sessions.
///
/// Identifiers are handed out in increasing order, so an entity keeps its ID for its whole lifetime and
/// equality checks can rely on IDs only.
#[derive(Clone, Debug, Default)]
pub struct IdCounter {
    next: u32,
}

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates counter which starts from the specified ID.
    pub fn starting_from(first: u32) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}
