//! Route table
//!
//! One descriptor per API operation. A [`Routes`] value is built once per
//! client and never changes afterwards, so each client gets its own set of
//! rate limiters.

use crate::endpoint::{EndpointDescriptor, PaginatedEndpoint, SingleEndpoint};
use crate::models::{Organization, Space, User};
use reqwest::Method;

/// Every endpoint the client knows about
#[derive(Debug, Clone)]
pub struct Routes {
    /// `GET /v1/user`
    pub current_user: SingleEndpoint<User>,
    /// `GET /v1/users/{id}`
    pub user: SingleEndpoint<User>,
    /// `GET /v1/spaces/{spaceId}`
    pub space: SingleEndpoint<Space>,
    /// `GET /v1/user/spaces`
    pub spaces: PaginatedEndpoint<Space>,
    /// `GET /v1/orgs`
    pub organizations: PaginatedEndpoint<Organization>,
    /// `GET /v1/orgs/{organizationId}/spaces`
    pub organization_spaces: PaginatedEndpoint<Space>,
}

impl Routes {
    pub fn new() -> Self {
        Self {
            current_user: SingleEndpoint::new(EndpointDescriptor::new(Method::GET, "user")),
            user: SingleEndpoint::new(EndpointDescriptor::new(Method::GET, "users/{id}")),
            space: SingleEndpoint::new(EndpointDescriptor::new(Method::GET, "spaces/{spaceId}")),
            spaces: PaginatedEndpoint::new(EndpointDescriptor::new(Method::GET, "user/spaces")),
            organizations: PaginatedEndpoint::new(EndpointDescriptor::new(Method::GET, "orgs")),
            organization_spaces: PaginatedEndpoint::new(EndpointDescriptor::new(
                Method::GET,
                "orgs/{organizationId}/spaces",
            )),
        }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        let routes = Routes::new();
        assert_eq!(routes.current_user.descriptor().path().as_str(), "/v1/user");
        assert_eq!(routes.user.descriptor().path().as_str(), "/v1/users/{id}");
        assert_eq!(routes.spaces.descriptor().path().as_str(), "/v1/user/spaces");
        assert_eq!(routes.organizations.descriptor().path().as_str(), "/v1/orgs");
        assert_eq!(
            routes.organization_spaces.descriptor().path().placeholders(),
            vec!["organizationId"]
        );
    }

    #[test]
    fn test_descriptors_do_not_share_limiters() {
        let routes = Routes::new();
        assert_eq!(
            routes.current_user.descriptor().to_string(),
            "Endpoint(GET, /v1/user)"
        );
        assert!(routes.user.descriptor().rate_limiter().limit().is_none());
        assert!(routes.space.descriptor().rate_limiter().limit().is_none());
    }
}
