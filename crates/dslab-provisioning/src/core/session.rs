//! Web session.

use serde::Serialize;

use crate::core::common::{DbBalancerId, InstanceId, SessionId};

/// An interactive user session which needs an application server and a database balancer.
///
/// Sessions are created by the simulation when user requests arrive. A load balancer writes the application server
/// once, the database balancer is filled in with the load balancer's default if the session has none.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub app_server: Option<InstanceId>,
    pub db_balancer: Option<DbBalancerId>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            app_server: None,
            db_balancer: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.app_server.is_some()
    }
}
