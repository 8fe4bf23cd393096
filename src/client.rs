//! GitBook API client
//!
//! The entry point of the crate: a transport plus the route table.

use crate::config::ClientConfig;
use crate::endpoints::Routes;
use crate::error::Result;
use crate::http::{HttpClient, Transport};
use crate::models::{Organization, Space, User};
use crate::pagination::Paginator;
use crate::template::PathParams;
use std::sync::Arc;

/// Typed client for the GitBook API.
///
/// Cloning is cheap and clones share the HTTP session and rate limiters.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    routes: Arc<Routes>,
}

impl Client {
    /// Create a client for the public API authenticated with `token`
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(token))
    }

    /// Create a client from a full configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::with_config(config.http_config()?)?;
        Ok(Self::with_transport(Arc::new(http)))
    }

    /// Create a client sending through any transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            routes: Arc::new(Routes::new()),
        }
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetch a user; `None` fetches the authenticated user
    pub async fn get_user(&self, id: Option<&str>) -> Result<User> {
        match id {
            Some(id) => {
                self.routes
                    .user
                    .call(self.transport.as_ref(), PathParams::new().with("id", id))
                    .await
            }
            None => {
                self.routes
                    .current_user
                    .call(self.transport.as_ref(), PathParams::new())
                    .await
            }
        }
    }

    /// Fetch a space by id
    pub async fn get_space(&self, id: &str) -> Result<Space> {
        self.routes
            .space
            .call(self.transport.as_ref(), PathParams::new().with("spaceId", id))
            .await
    }

    /// Spaces of the authenticated user
    pub fn get_spaces(&self) -> Result<Paginator<Space>> {
        self.routes
            .spaces
            .paginate(Arc::clone(&self.transport), PathParams::new())
    }

    /// Organizations the authenticated user belongs to
    pub fn get_organizations(&self) -> Result<Paginator<Organization>> {
        self.routes
            .organizations
            .paginate(Arc::clone(&self.transport), PathParams::new())
    }

    /// Spaces of an organization
    pub fn get_organization_spaces(&self, organization_id: &str) -> Result<Paginator<Space>> {
        self.routes.organization_spaces.paginate(
            Arc::clone(&self.transport),
            PathParams::new().with("organizationId", organization_id),
        )
    }
}
