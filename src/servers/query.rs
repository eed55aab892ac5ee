use std::collections::HashMap;

use serde::Deserialize;
use uuid::Uuid;

use crate::{Error, models::ServerSummary};

/// Raw query string of `GET /servers/select`. The parameter names are the
/// wire contract and must not change.
#[derive(Debug, Default, Deserialize)]
pub struct ServerListParams {
    pub category: Option<String>,
    pub qty: Option<String>,
    pub by_user: Option<String>,
    pub by_serverid: Option<String>,
    pub with_num_members: Option<String>,
}

/// Normalized listing request. Boolean parameters only count when they are
/// the literal `"true"`; empty string parameters are treated as absent.
#[derive(Debug, Default, Clone)]
pub struct ServerListQuery {
    pub category: Option<String>,
    pub qty: Option<String>,
    pub by_user: bool,
    pub by_serverid: Option<String>,
    pub with_num_members: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<ServerListParams> for ServerListQuery {
    fn from(params: ServerListParams) -> Self {
        Self {
            category: non_empty(params.category),
            qty: non_empty(params.qty),
            by_user: params.by_user.as_deref() == Some("true"),
            by_serverid: non_empty(params.by_serverid),
            with_num_members: params.with_num_members.as_deref() == Some("true"),
        }
    }
}

impl ServerListQuery {
    /// The one authorization predicate: filtering by membership or by server
    /// id both need an authenticated caller. Checked once, before any filter
    /// stage runs.
    pub fn requires_authentication(&self) -> bool {
        self.by_user || self.by_serverid.is_some()
    }

    /// Requested result cap. Must be a non-negative integer.
    pub fn qty(&self) -> Result<Option<i64>, Error> {
        let Some(raw) = self.qty.as_deref() else {
            return Ok(None);
        };
        let qty = raw
            .parse::<i64>()
            .map_err(|_| Error::InvalidArgument(format!("Invalid qty value {raw}")))?;
        if qty < 0 {
            return Err(Error::InvalidArgument(format!("Invalid qty value {raw}")));
        }
        Ok(Some(qty))
    }

    /// Requested server id, if any.
    pub fn server_id(&self) -> Result<Option<Uuid>, Error> {
        let Some(raw) = self.by_serverid.as_deref() else {
            return Ok(None);
        };
        let id = Uuid::parse_str(raw)
            .map_err(|_| Error::InvalidArgument("Server value error".to_string()))?;
        Ok(Some(id))
    }
}

/// Attaches member counts to a loaded page of servers. Servers with no
/// membership rows count as zero.
pub fn attach_member_counts(servers: &mut [ServerSummary], counts: &[(Uuid, i64)]) {
    let counts: HashMap<Uuid, i64> = counts.iter().copied().collect();
    for server in servers {
        server.num_members = Some(counts.get(&server.id).copied().unwrap_or(0));
    }
}

/// Restricts an already-filtered page to a single server id. A server that
/// exists globally but was narrowed away by an earlier stage is reported as
/// not found.
pub fn select_by_server_id(
    servers: Vec<ServerSummary>,
    id: Uuid,
) -> Result<Vec<ServerSummary>, Error> {
    let matched: Vec<ServerSummary> = servers.into_iter().filter(|s| s.id == id).collect();
    if matched.is_empty() {
        return Err(Error::ServerNotFound(id.to_string()));
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn params(
        category: Option<&str>,
        qty: Option<&str>,
        by_user: Option<&str>,
        by_serverid: Option<&str>,
        with_num_members: Option<&str>,
    ) -> ServerListParams {
        ServerListParams {
            category: category.map(str::to_string),
            qty: qty.map(str::to_string),
            by_user: by_user.map(str::to_string),
            by_serverid: by_serverid.map(str::to_string),
            with_num_members: with_num_members.map(str::to_string),
        }
    }

    fn summary(id: Uuid) -> ServerSummary {
        ServerSummary {
            id,
            name: "gaming lounge".to_string(),
            owner_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            description: None,
            icon_path: None,
            created_at: Utc::now(),
            num_members: None,
        }
    }

    #[test]
    fn booleans_only_accept_the_true_literal() {
        let query: ServerListQuery =
            params(None, None, Some("true"), None, Some("true")).into();
        assert!(query.by_user);
        assert!(query.with_num_members);

        let query: ServerListQuery = params(None, None, Some("1"), None, Some("yes")).into();
        assert!(!query.by_user);
        assert!(!query.with_num_members);
    }

    #[test]
    fn empty_parameters_are_treated_as_absent() {
        let query: ServerListQuery = params(Some(""), Some(""), None, Some(""), None).into();
        assert!(query.category.is_none());
        assert!(query.qty.is_none());
        assert!(query.by_serverid.is_none());
        assert!(!query.requires_authentication());
    }

    #[test]
    fn membership_and_id_filters_require_authentication() {
        let by_user: ServerListQuery = params(None, None, Some("true"), None, None).into();
        assert!(by_user.requires_authentication());

        let by_id: ServerListQuery =
            params(None, None, None, Some(&Uuid::new_v4().to_string()), None).into();
        assert!(by_id.requires_authentication());

        let both: ServerListQuery = params(
            None,
            None,
            Some("true"),
            Some(&Uuid::new_v4().to_string()),
            None,
        )
        .into();
        assert!(both.requires_authentication());

        let neither: ServerListQuery = params(Some("gaming"), Some("2"), None, None, None).into();
        assert!(!neither.requires_authentication());
    }

    #[test]
    fn qty_parses_non_negative_integers() {
        let query: ServerListQuery = params(None, Some("2"), None, None, None).into();
        assert_eq!(query.qty().unwrap(), Some(2));

        let query: ServerListQuery = params(None, Some("0"), None, None, None).into();
        assert_eq!(query.qty().unwrap(), Some(0));

        let query: ServerListQuery = params(None, None, None, None, None).into();
        assert_eq!(query.qty().unwrap(), None);
    }

    #[test]
    fn bad_qty_is_a_caller_error() {
        for raw in ["abc", "-1", "2.5"] {
            let query: ServerListQuery = params(None, Some(raw), None, None, None).into();
            assert!(matches!(query.qty(), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn malformed_server_id_is_a_value_error() {
        let query: ServerListQuery = params(None, None, None, Some("999"), None).into();
        match query.server_id() {
            Err(Error::InvalidArgument(msg)) => assert_eq!(msg, "Server value error"),
            other => panic!("expected value error, got {other:?}"),
        }
    }

    #[test]
    fn well_formed_server_id_parses() {
        let id = Uuid::new_v4();
        let query: ServerListQuery = params(None, None, None, Some(&id.to_string()), None).into();
        assert_eq!(query.server_id().unwrap(), Some(id));
    }

    #[test]
    fn member_counts_default_to_zero() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut servers = vec![summary(a), summary(b)];
        attach_member_counts(&mut servers, &[(a, 3)]);
        assert_eq!(servers[0].num_members, Some(3));
        assert_eq!(servers[1].num_members, Some(0));
    }

    #[test]
    fn selecting_a_present_id_keeps_exactly_that_server() {
        let wanted = Uuid::new_v4();
        let servers = vec![summary(Uuid::new_v4()), summary(wanted)];
        let result = select_by_server_id(servers, wanted).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, wanted);
    }

    #[test]
    fn selecting_an_absent_id_is_not_found() {
        let wanted = Uuid::new_v4();
        let servers = vec![summary(Uuid::new_v4())];
        match select_by_server_id(servers, wanted) {
            Err(Error::ServerNotFound(id)) => assert_eq!(id, wanted.to_string()),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn not_found_message_contains_the_requested_id() {
        let wanted = Uuid::new_v4();
        let err = select_by_server_id(vec![], wanted).unwrap_err();
        assert!(err.to_string().contains(&wanted.to_string()));
    }
}
