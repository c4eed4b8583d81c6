//! Repository trait implementations for SQLite
//!
//! Each repository is implemented in its own module for better organization.

mod artifact;
mod deployer;
mod deployment;
mod event_log;
mod network;
mod subscription;

use kiln_core::{
    ArtifactRepository, DeployerRepository, DeploymentRepository, EventLogRepository,
    NetworkRepository, Repositories, SubscriptionRepository,
};

use crate::Database;

impl Repositories for Database {
    fn artifacts(&self) -> &dyn ArtifactRepository {
        self
    }

    fn networks(&self) -> &dyn NetworkRepository {
        self
    }

    fn deployers(&self) -> &dyn DeployerRepository {
        self
    }

    fn deployments(&self) -> &dyn DeploymentRepository {
        self
    }

    fn subscriptions(&self) -> &dyn SubscriptionRepository {
        self
    }

    fn event_logs(&self) -> &dyn EventLogRepository {
        self
    }
}
